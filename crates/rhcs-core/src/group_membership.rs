//! Membership of a user in a cluster group.
//!
//! A membership cannot be changed in place: changing any attribute means
//! removing the membership and adding a new one.

use rhcs_client::{ApiError, ClusterClient, GroupMembershipClient, User};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ReconcileError, Result};
use crate::obs::{self, ReconcileSpan};
use crate::poll::{cancellable, wait_for_cluster_ready, PollSettings};

/// Stored state of one group membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub cluster: String,
    pub group: String,
    pub user: String,
    /// Remote identifier of the member, known once the membership exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl GroupMembership {
    pub fn new(
        cluster: impl Into<String>,
        group: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            group: group.into(),
            user: user.into(),
            id: None,
        }
    }

    /// Remote member id, falling back to the declared user.
    fn member_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.user)
    }

    fn target(&self) -> String {
        format!("{}/{}", self.group, self.member_id())
    }

    fn populate(&mut self, user: &User) {
        if let Some(id) = &user.id {
            self.id = Some(id.clone());
            self.user = id.clone();
        }
    }

    fn remote_failure(&self, operation: &'static str, source: ApiError) -> ReconcileError {
        obs::emit_remote_call_failed(operation, &self.cluster, &source);
        ReconcileError::remote(operation, &self.cluster, Some(&self.target()), source)
    }
}

/// Add the user to the group once the cluster is ready.
pub async fn create_group_membership<C>(
    client: &C,
    planned: &GroupMembership,
    settings: PollSettings,
    cancel: &CancellationToken,
) -> Result<GroupMembership>
where
    C: ClusterClient + GroupMembershipClient + ?Sized,
{
    let _span = ReconcileSpan::enter("group_membership", &planned.cluster);
    wait_for_cluster_ready(client, &planned.cluster, settings, cancel).await?;

    let member = User::new(planned.user.as_str());
    let added = cancellable(&planned.cluster, cancel, async {
        client
            .add_user(&planned.cluster, &planned.group, &member)
            .await
            .map_err(|e| planned.remote_failure("add group member", e))
    })
    .await?;

    let mut state = planned.clone();
    state.populate(&added);
    obs::emit_membership_added(&state.cluster, &state.group, state.member_id());
    Ok(state)
}

/// Refresh a membership from the API.
pub async fn read_group_membership<C>(client: &C, stored: &GroupMembership) -> Result<GroupMembership>
where
    C: GroupMembershipClient + ?Sized,
{
    let user = client
        .get_user(&stored.cluster, &stored.group, stored.member_id())
        .await
        .map_err(|e| stored.remote_failure("get group member", e))?;

    let mut state = stored.clone();
    state.populate(&user);
    Ok(state)
}

/// Always fails: memberships are replaced, never updated.
pub fn update_group_membership(
    _stored: &GroupMembership,
    _planned: &GroupMembership,
) -> Result<GroupMembership> {
    Err(ReconcileError::InvalidConfiguration(
        "group membership update is not supported".to_string(),
    ))
}

/// Remove the user from the group. The caller discards the stored state.
pub async fn delete_group_membership<C>(client: &C, stored: &GroupMembership) -> Result<()>
where
    C: GroupMembershipClient + ?Sized,
{
    client
        .delete_user(&stored.cluster, &stored.group, stored.member_id())
        .await
        .map_err(|e| stored.remote_failure("delete group member", e))?;
    obs::emit_membership_removed(&stored.cluster, &stored.group, stored.member_id());
    Ok(())
}

/// State for an existing membership named `cluster/group/user`.
pub fn import_group_membership(import_id: &str) -> Result<GroupMembership> {
    let parts: Vec<&str> = import_id.split('/').collect();
    match parts.as_slice() {
        [cluster, group, user] if parts.iter().all(|p| !p.trim().is_empty()) => {
            let mut state = GroupMembership::new(*cluster, *group, *user);
            state.id = Some(user.to_string());
            Ok(state)
        }
        _ => Err(ReconcileError::InvalidConfiguration(format!(
            "import id '{}' must have the form 'cluster/group/user'",
            import_id
        ))),
    }
}
