//! Organization hierarchy and user directory persistence.

use std::sync::Arc;

use super::helpers::{Adapters, TestDatabase, database, test_runtime};
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::{
    access::{domain::Role, ports::HierarchyLookup},
    organization::{
        adapters::postgres::PostgresOrganizationRepository,
        domain::{HierarchyViolation, OrganizationDomainError, OrganizationId},
        services::{
            CreateOrganizationRequest, OrganizationService, OrganizationServiceError,
            ParentChange, UpdateOrganizationRequest,
        },
    },
    user::{
        ports::UserRepositoryError,
        services::{RegisterUserRequest, UserDirectoryError, UserDirectoryService},
    },
};

type PgOrganizationService = OrganizationService<PostgresOrganizationRepository, DefaultClock>;

fn organization_service(adapters: &Adapters) -> PgOrganizationService {
    OrganizationService::new(Arc::clone(&adapters.organizations), Arc::new(DefaultClock))
}

#[rstest]
fn hierarchy_lookups_follow_parent_links(database: eyre::Result<TestDatabase>) -> eyre::Result<()> {
    let test_db = database?;
    test_runtime()?.block_on(follow_parent_links(&test_db.adapters()))
}

async fn follow_parent_links(adapters: &Adapters) -> eyre::Result<()> {
    let service = organization_service(adapters);
    let root = service.create(CreateOrganizationRequest::new("Org 0")).await?;
    let child = service
        .create(CreateOrganizationRequest::new("Org 1").with_parent(root.id()))
        .await?;
    let other = service.create(CreateOrganizationRequest::new("Org 2")).await?;

    eyre::ensure!(
        adapters
            .organizations
            .is_direct_child_of(root.id(), child.id())
            .await?
    );
    eyre::ensure!(
        adapters
            .organizations
            .direct_children_of(root.id())
            .await?
            == vec![child.id()]
    );

    let rejected = service
        .update(
            other.id(),
            UpdateOrganizationRequest::new().with_parent(ParentChange::AttachTo(child.id())),
        )
        .await;
    eyre::ensure!(
        matches!(
            rejected,
            Err(OrganizationServiceError::Domain(
                OrganizationDomainError::InvalidHierarchy(HierarchyViolation::ParentIsChild { .. })
            ))
        ),
        "expected ParentIsChild, got {rejected:?}"
    );
    eyre::ensure!(service.find(other.id()).await?.parent_id().is_none());

    service.remove(root.id()).await?;
    eyre::ensure!(
        matches!(
            service.find(child.id()).await,
            Err(OrganizationServiceError::NotFound(_))
        ),
        "children are removed with their parent"
    );
    Ok(())
}

#[rstest]
fn emails_are_unique_across_organizations(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let test_db = database?;
    test_runtime()?.block_on(unique_emails(&test_db.adapters()))
}

async fn unique_emails(adapters: &Adapters) -> eyre::Result<()> {
    let organizations = organization_service(adapters);
    let directory = UserDirectoryService::new(
        Arc::clone(&adapters.users),
        Arc::clone(&adapters.organizations),
        Arc::new(DefaultClock),
    );
    let acme = organizations.create(CreateOrganizationRequest::new("Acme")).await?;
    let globex = organizations.create(CreateOrganizationRequest::new("Globex")).await?;

    let user = directory
        .register_user(RegisterUserRequest::new("Sam@Example.test", Role::Admin, acme.id()))
        .await?;
    let duplicate = directory
        .register_user(RegisterUserRequest::new("sam@example.test", Role::Viewer, globex.id()))
        .await;

    eyre::ensure!(
        matches!(
            duplicate,
            Err(UserDirectoryError::Repository(UserRepositoryError::DuplicateEmail(_)))
        ),
        "expected DuplicateEmail, got {duplicate:?}"
    );
    let caller = directory.resolve_caller(user.id()).await?;
    eyre::ensure!(caller.role() == Role::Admin && caller.organization_id() == acme.id());
    Ok(())
}

#[rstest]
fn racing_reparents_never_build_a_third_level(
    database: eyre::Result<TestDatabase>,
) -> eyre::Result<()> {
    let test_db = database?;
    test_runtime()?.block_on(racing_reparents(&test_db.adapters()))
}

/// Every round pairs `A -> B` with `C -> A` on fresh roots; whichever
/// commits second must see the other and be rejected.
async fn racing_reparents(adapters: &Adapters) -> eyre::Result<()> {
    let service = Arc::new(organization_service(adapters));
    for round in 0..16 {
        let mut roots = Vec::with_capacity(3);
        for name in ["A", "B", "C"] {
            roots.push(
                service
                    .create(CreateOrganizationRequest::new(format!("{name}{round}")))
                    .await?
                    .id(),
            );
        }
        let [a, b, c] = roots.as_slice() else {
            return Err(eyre::eyre!("expected three roots"));
        };

        let attach_a = tokio::spawn(reparent(Arc::clone(&service), *a, *b));
        let attach_c = tokio::spawn(reparent(Arc::clone(&service), *c, *a));
        let outcomes = [attach_a.await?, attach_c.await?];

        let accepted = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
        eyre::ensure!(accepted == 1, "round {round}: {accepted} re-parents accepted");
        for outcome in outcomes {
            if let Err(err) = outcome {
                eyre::ensure!(
                    matches!(
                        err,
                        OrganizationServiceError::Domain(
                            OrganizationDomainError::InvalidHierarchy(_)
                        )
                    ),
                    "round {round}: unexpected rejection {err:?}"
                );
            }
        }
        for id in [*a, *b, *c] {
            ensure_at_most_two_levels(&service, id).await?;
        }
    }
    Ok(())
}

async fn reparent(
    service: Arc<PgOrganizationService>,
    child: OrganizationId,
    parent: OrganizationId,
) -> Result<(), OrganizationServiceError> {
    service
        .update(
            child,
            UpdateOrganizationRequest::new().with_parent(ParentChange::AttachTo(parent)),
        )
        .await
        .map(|_| ())
}

async fn ensure_at_most_two_levels(
    service: &PgOrganizationService,
    id: OrganizationId,
) -> eyre::Result<()> {
    let organization = service.find(id).await?;
    if let Some(parent_id) = organization.parent_id() {
        let parent = service.find(parent_id).await?;
        eyre::ensure!(
            parent.parent_id().is_none(),
            "{id} sits below {parent_id}, which is itself a child"
        );
    }
    Ok(())
}
