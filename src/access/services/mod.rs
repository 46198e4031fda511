//! Organization-scope policy and authorizer.

mod scope;

pub use scope::{AccessError, AccessResult, OrgScopeAuthorizer, accessible_org_ids, has_access};
