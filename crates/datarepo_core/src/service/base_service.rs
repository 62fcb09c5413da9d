//! Generic CRUD use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for application callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::entity::Entity;
use crate::repo::base_repo::{AsyncRepository, Repository};
use crate::repo::error::RepoResult;
use crate::repo::query::{Filter, OrderBy, PageRequest};
use std::marker::PhantomData;

/// Use-case service wrapper for CRUD over one entity type.
pub struct BaseService<T: Entity, R> {
    repo: R,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity, R> BaseService<T, R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Returns the wrapped repository, e.g. to close its session.
    pub fn into_inner(self) -> R {
        self.repo
    }
}

impl<T: Entity, R: Repository<T>> BaseService<T, R> {
    pub fn get(&self, id: &T::Key) -> RepoResult<Option<T>> {
        self.repo.get(id)
    }

    /// Returns records `(page_number - 1) * page_size ..` ordered by `order_by`.
    pub fn get_page(&self, page: PageRequest, order_by: &OrderBy) -> RepoResult<Vec<T>> {
        self.repo.get_page(page, order_by)
    }

    pub fn get_all(&self) -> RepoResult<Vec<T>> {
        self.repo.get_all()
    }

    /// Returns the unique match, `None` when nothing matches.
    ///
    /// Ambiguous filters surface `RepoError::NonUnique` unchanged.
    pub fn find(&self, filter: &Filter) -> RepoResult<Option<T>> {
        self.repo.find(filter)
    }

    pub fn find_all(&self, filter: &Filter) -> RepoResult<Vec<T>> {
        self.repo.find_all(filter)
    }

    pub fn add(&self, entity: T) -> RepoResult<T> {
        self.repo.add(entity)
    }

    pub fn add_all(&self, entities: Vec<T>) -> RepoResult<Vec<T>> {
        self.repo.add_all(entities)
    }

    pub fn update(&self, updated: &T, key: &T::Key) -> RepoResult<Option<T>> {
        self.repo.update(updated, key)
    }

    pub fn delete(&self, entity: &T) -> RepoResult<usize> {
        self.repo.delete(entity)
    }

    pub fn delete_by_key(&self, key: &T::Key) -> RepoResult<usize> {
        self.repo.delete_by_key(key)
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count()
    }
}

impl<T: Entity, R: AsyncRepository<T>> BaseService<T, R> {
    pub async fn get_async(&self, id: T::Key) -> RepoResult<Option<T>> {
        self.repo.get_async(id).await
    }

    pub async fn get_page_async(&self, page: PageRequest, order_by: OrderBy) -> RepoResult<Vec<T>> {
        self.repo.get_page_async(page, order_by).await
    }

    pub async fn get_all_async(&self) -> RepoResult<Vec<T>> {
        self.repo.get_all_async().await
    }

    pub async fn find_async(&self, filter: Filter) -> RepoResult<Option<T>> {
        self.repo.find_async(filter).await
    }

    pub async fn find_all_async(&self, filter: Filter) -> RepoResult<Vec<T>> {
        self.repo.find_all_async(filter).await
    }

    pub async fn add_async(&self, entity: T) -> RepoResult<T> {
        self.repo.add_async(entity).await
    }

    pub async fn add_all_async(&self, entities: Vec<T>) -> RepoResult<Vec<T>> {
        self.repo.add_all_async(entities).await
    }

    pub async fn update_async(&self, updated: T, key: T::Key) -> RepoResult<Option<T>> {
        self.repo.update_async(updated, key).await
    }

    pub async fn delete_async(&self, entity: T) -> RepoResult<usize> {
        self.repo.delete_async(entity).await
    }

    pub async fn delete_by_key_async(&self, key: T::Key) -> RepoResult<usize> {
        self.repo.delete_by_key_async(key).await
    }

    pub async fn count_async(&self) -> RepoResult<u64> {
        self.repo.count_async().await
    }
}
