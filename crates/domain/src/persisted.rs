//! Saved aggregate snapshots and lookup helpers shared by the services.

use common::AggregateId;
use persistence::{
    Aggregate, AggregateSet, AuditMetadata, ContextFactory, RecordQuery, RecordStore, UnitOfWork,
    Version,
};

use crate::error::DomainError;

/// An aggregate together with its stored version and audit columns.
#[derive(Debug, Clone)]
pub struct Persisted<A> {
    pub aggregate: A,

    /// Stored version as of the last load or save.
    pub version: Version,

    /// Audit columns as of the last load or save.
    pub audit: AuditMetadata,
}

impl<A: Aggregate> Persisted<A> {
    /// Reads the tracked state of `id` back out of a unit of work.
    pub(crate) fn capture<S: RecordStore>(
        uow: &mut UnitOfWork<S>,
        id: AggregateId,
    ) -> Result<Self, DomainError> {
        let set = uow.set::<A>();
        match (set.get(id), set.version(id), set.audit(id)) {
            (Some(aggregate), Some(version), Some(audit)) => Ok(Self {
                aggregate: aggregate.clone(),
                version,
                audit: audit.clone(),
            }),
            _ => Err(DomainError::not_found::<A>(id)),
        }
    }
}

/// The state a mutation reports back once `save` has written `written` rows.
///
/// A save that wrote nothing left the stored row as it was, so the stored row
/// is returned instead of the tracked aggregate. They differ when a change
/// was invisible to its comparer, such as a reordered unordered list.
pub(crate) async fn saved<A, S>(
    uow: &mut UnitOfWork<S>,
    factory: &ContextFactory<S>,
    id: AggregateId,
    written: usize,
) -> Result<Persisted<A>, DomainError>
where
    A: Aggregate,
    S: RecordStore,
{
    if written > 0 {
        return Persisted::capture(uow, id);
    }
    fetch(factory, id)
        .await?
        .ok_or_else(|| DomainError::not_found::<A>(id))
}

/// Finds `id` in `set`, loading it if needed, or fails with `NotFound`.
pub(crate) async fn require<'s, A, S>(
    set: &'s mut AggregateSet<'_, A, S>,
    id: AggregateId,
) -> Result<&'s mut A, DomainError>
where
    A: Aggregate,
    S: RecordStore,
{
    set.find(id)
        .await?
        .ok_or_else(|| DomainError::not_found::<A>(id))
}

/// Loads one aggregate in a fresh unit of work.
pub(crate) async fn fetch<A, S>(
    factory: &ContextFactory<S>,
    id: AggregateId,
) -> Result<Option<Persisted<A>>, DomainError>
where
    A: Aggregate,
    S: RecordStore,
{
    let mut uow = factory.begin();
    if uow.set::<A>().find(id).await?.is_none() {
        return Ok(None);
    }
    Persisted::capture(&mut uow, id).map(Some)
}

/// Loads the aggregates matching `query`, oldest first.
pub(crate) async fn list<A, S>(
    factory: &ContextFactory<S>,
    query: &RecordQuery,
) -> Result<Vec<Persisted<A>>, DomainError>
where
    A: Aggregate,
    S: RecordStore,
{
    let mut uow = factory.begin();
    let ids: Vec<AggregateId> = uow
        .set::<A>()
        .query(query)
        .await?
        .iter()
        .map(|aggregate| aggregate.id())
        .collect();

    ids.into_iter()
        .map(|id| Persisted::capture(&mut uow, id))
        .collect()
}
