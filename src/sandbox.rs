//! Developer sandbox users.

use std::{collections::BTreeMap, time::Duration};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use md5::{Digest, Md5};
use tracing::info;
use wait_until::Check;

use crate::{
    Cluster, Error, Result,
    common,
    crd::{UserSignup, UserSignupSpec, is_condition_true},
    wait::LastSeen,
};

/// Namespace the toolchain host operator watches for signups.
pub const HOST_OPERATOR_NAMESPACE: &str = "toolchain-host-operator";

pub const USER_EMAIL_ANNOTATION: &str = "toolchain.dev.openshift.com/user-email";
pub const EMAIL_HASH_LABEL: &str = "toolchain.dev.openshift.com/email-hash";

pub const DEFAULT_USER: &str = "user1";
pub const DEFAULT_EMAIL: &str = "user1@user.us";

const SIGNUP_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Hex encoded MD5 of an email address, as the host operator labels signups.
pub fn email_hash(email: &str) -> String {
    format!("{:x}", Md5::digest(email.as_bytes()))
}

fn user_signup(username: &str, email: &str) -> UserSignup {
    UserSignup::with_metadata(
        ObjectMeta {
            name: Some(username.to_owned()),
            namespace: Some(HOST_OPERATOR_NAMESPACE.to_owned()),
            annotations: Some(BTreeMap::from([(
                USER_EMAIL_ANNOTATION.to_owned(),
                email.to_owned(),
            )])),
            labels: Some(BTreeMap::from([(EMAIL_HASH_LABEL.to_owned(), email_hash(email))])),
            ..ObjectMeta::default()
        },
        UserSignupSpec {
            userid: username.to_owned(),
            username: username.to_owned(),
            states: vec!["approved".to_owned()],
        },
    )
}

async fn signup_complete(cluster: &Cluster, username: &str, seen: LastSeen) -> Check<Error> {
    match cluster.get::<UserSignup>(HOST_OPERATOR_NAMESPACE, username).await {
        Ok(signup) => {
            let conditions = signup
                .status
                .as_ref()
                .map(|status| status.conditions.as_slice())
                .unwrap_or_default();
            if is_condition_true(conditions, "Complete") {
                Check::Done
            } else {
                seen.record(format_args!("{} conditions reported", conditions.len()));
                Check::Pending
            }
        }
        Err(error) => Check::Failed(error),
    }
}

/// Create a pre-approved signup and wait up to two minutes for the host
/// operator to complete it. Failing to read the signup back is fatal.
pub async fn register_user(cluster: &Cluster, username: &str, email: &str) -> Result<UserSignup> {
    info!(message = "Registering sandbox user.", username, email);
    let created = cluster
        .create(HOST_OPERATOR_NAMESPACE, &user_signup(username, email))
        .await?;
    common::wait_for(&format!("user signup {username}"), SIGNUP_TIMEOUT, |seen| {
        signup_complete(cluster, username, seen)
    })
    .await?;
    Ok(created)
}

pub async fn delete_user_signup(cluster: &Cluster, username: &str) -> Result<()> {
    cluster
        .delete::<UserSignup>(HOST_OPERATOR_NAMESPACE, username)
        .await
}
