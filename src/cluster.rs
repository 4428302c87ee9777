//! The single handle every domain helper uses to reach the API server.

use std::fmt::Debug;

use k8s_openapi::NamespaceResourceScope;
use kube::{
    Api, Client, Resource,
    api::{DeleteParams, ListParams, Patch, PatchParams, PostParams},
};
use serde::{Serialize, de::DeserializeOwned};
use snafu::ResultExt;
use tracing::debug;

use crate::{
    Result,
    error::{ClientSetupSnafu, KubeSnafu, NotFoundSnafu, is_status},
};

/// Bound shared by every namespaced object the harness manipulates.
pub trait NamespacedResource:
    Resource<Scope = NamespaceResourceScope, DynamicType = ()>
    + Clone
    + Debug
    + DeserializeOwned
    + Serialize
{
}

impl<K> NamespacedResource for K where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
{
}

/// A connection to the cluster under test.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Cluster {
    client: Client,
}

impl Cluster {
    /// Connect with the local kubeconfig or the in-cluster service account.
    pub async fn connect() -> Result<Self> {
        let client = Client::try_default().await.context(ClientSetupSnafu)?;
        Ok(Self::from_client(client))
    }

    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub fn api<K: NamespacedResource>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub fn cluster_api<K>(&self) -> Api<K>
    where
        K: Resource<DynamicType = ()>,
    {
        Api::all(self.client.clone())
    }

    /// Fetch an object, turning `404` into [`crate::Error::NotFound`].
    pub async fn get<K: NamespacedResource>(&self, namespace: &str, name: &str) -> Result<K> {
        match self.get_opt(namespace, name).await? {
            Some(object) => Ok(object),
            None => NotFoundSnafu {
                kind: K::kind(&()),
                name,
                namespace,
            }
            .fail(),
        }
    }

    pub async fn get_opt<K: NamespacedResource>(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<K>> {
        self.api::<K>(namespace)
            .get_opt(name)
            .await
            .with_context(|_| KubeSnafu {
                action: format!("get {} {namespace}/{name}", K::kind(&())),
            })
    }

    pub async fn create<K: NamespacedResource>(&self, namespace: &str, object: &K) -> Result<K> {
        let created = self
            .api::<K>(namespace)
            .create(&PostParams::default(), object)
            .await
            .with_context(|_| KubeSnafu {
                action: format!("create {} in {namespace}", K::kind(&())),
            })?;
        debug!(
            message = "Created object.",
            kind = %K::kind(&()),
            namespace,
            name = created.meta().name.as_deref().unwrap_or_default(),
        );
        Ok(created)
    }

    pub async fn replace<K: NamespacedResource>(&self, namespace: &str, object: &K) -> Result<K> {
        let name = object.meta().name.clone().unwrap_or_default();
        self.api::<K>(namespace)
            .replace(&name, &PostParams::default(), object)
            .await
            .with_context(|_| KubeSnafu {
                action: format!("replace {} {namespace}/{name}", K::kind(&())),
            })
    }

    /// List objects matching every `key=value` pair in `labels`.
    pub async fn list<K: NamespacedResource>(
        &self,
        namespace: &str,
        labels: &[(&str, &str)],
    ) -> Result<Vec<K>> {
        let mut params = ListParams::default();
        if !labels.is_empty() {
            params = params.labels(&label_selector(labels));
        }
        let list = self
            .api::<K>(namespace)
            .list(&params)
            .await
            .with_context(|_| KubeSnafu {
                action: format!("list {} in {namespace}", K::kind(&())),
            })?;
        Ok(list.items)
    }

    /// Delete an object. Deleting something already gone succeeds.
    pub async fn delete<K: NamespacedResource>(&self, namespace: &str, name: &str) -> Result<()> {
        match self
            .api::<K>(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(error) if is_status(&error, 404) => Ok(()),
            Err(source) => Err(source).context(KubeSnafu {
                action: format!("delete {} {namespace}/{name}", K::kind(&())),
            }),
        }
    }

    /// Delete every object of kind `K` in `namespace`.
    pub async fn delete_all<K: NamespacedResource>(&self, namespace: &str) -> Result<()> {
        self.api::<K>(namespace)
            .delete_collection(&DeleteParams::default(), &ListParams::default())
            .await
            .with_context(|_| KubeSnafu {
                action: format!("delete all {} in {namespace}", K::kind(&())),
            })?;
        Ok(())
    }

    /// Merge `patch` into the status subresource.
    pub async fn patch_status<K: NamespacedResource>(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K> {
        self.api::<K>(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .with_context(|_| KubeSnafu {
                action: format!("patch status of {} {namespace}/{name}", K::kind(&())),
            })
    }
}

pub(crate) fn label_selector(labels: &[(&str, &str)]) -> String {
    labels
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use http_1::Method;
    use k8s_openapi::api::core::v1::ConfigMap;

    use super::*;
    use crate::{
        Error,
        crd::{Application, ApplicationSpec},
        test_util::{json_response, mock_cluster, status_response},
    };

    #[test]
    fn selector_joins_pairs() {
        assert_eq!(label_selector(&[("a", "1"), ("b", "two")]), "a=1,b=two");
        assert_eq!(label_selector(&[]), "");
    }

    #[tokio::test]
    async fn get_maps_missing_objects() {
        let (cluster, mut handle) = mock_cluster();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), Method::GET);
            assert_eq!(
                request.uri().path(),
                "/apis/appstudio.redhat.com/v1alpha1/namespaces/e2e/applications/missing"
            );
            send.send_response(status_response(404, "NotFound"));
        });

        let error = cluster
            .get::<Application>("e2e", "missing")
            .await
            .unwrap_err();
        server.await.unwrap();
        assert!(error.is_not_found());
        assert_eq!(
            error.to_string(),
            r#"Application "missing" not found in namespace "e2e""#
        );
    }

    #[tokio::test]
    async fn list_sends_label_selector() {
        let (cluster, mut handle) = mock_cluster();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            let query = request.uri().query().unwrap_or_default().to_owned();
            send.send_response(json_response(
                200,
                &serde_json::json!({
                    "apiVersion": "v1",
                    "kind": "ConfigMapList",
                    "metadata": {},
                    "items": [{"metadata": {"name": "one", "namespace": "e2e"}}]
                }),
            ));
            query
        });

        let items = cluster
            .list::<ConfigMap>("e2e", &[("app", "demo")])
            .await
            .unwrap();
        let query = server.await.unwrap();
        assert!(query.contains("labelSelector=app%3Ddemo"), "{query}");
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn delete_ignores_missing_objects() {
        let (cluster, mut handle) = mock_cluster();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), Method::DELETE);
            send.send_response(status_response(404, "NotFound"));
        });

        cluster.delete::<ConfigMap>("e2e", "gone").await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn create_conflict_is_reported() {
        let (cluster, mut handle) = mock_cluster();
        let server = tokio::spawn(async move {
            let (request, send) = handle.next_request().await.unwrap();
            assert_eq!(request.method(), Method::POST);
            send.send_response(status_response(409, "AlreadyExists"));
        });

        let application = Application::new("demo", "e2e", ApplicationSpec::default());
        let error = cluster.create("e2e", &application).await.unwrap_err();
        server.await.unwrap();
        assert!(error.is_already_exists());
        assert!(matches!(error, Error::Kube { .. }));
    }
}
