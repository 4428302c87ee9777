use serde::{Deserialize, Serialize};

use super::Condition;

custom_resource! {
    /// A set of components delivered together.
    Application {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "applications",
        spec: ApplicationSpec,
        status: ApplicationStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// The application devfile rendered by the controller, as YAML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devfile: Option<String>,
}

custom_resource! {
    /// A buildable unit of an [`Application`], backed by a git repository.
    Component {
        group: "appstudio.redhat.com",
        version: "v1alpha1",
        plural: "components",
        spec: ComponentSpec,
        status: ComponentStatus,
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub component_name: String,
    pub application: String,
    #[serde(default)]
    pub source: ComponentSource,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSource>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub revision: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(default, rename = "devfileUrl", skip_serializing_if = "String::is_empty")]
    pub devfile_url: String,
    #[serde(default, rename = "dockerfileUrl", skip_serializing_if = "String::is_empty")]
    pub dockerfile_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_image: String,
}

#[cfg(test)]
mod tests {
    use kube::Resource;

    use super::*;

    #[test]
    fn resource_metadata() {
        assert_eq!(Component::api_version(&()), "appstudio.redhat.com/v1alpha1");
        assert_eq!(Component::plural(&()), "components");
        assert_eq!(Application::kind(&()), "Application");
    }

    #[test]
    fn serializes_with_type_information() {
        let application = Application::new(
            "demo",
            "e2e",
            ApplicationSpec {
                display_name: "demo".to_owned(),
                description: None,
            },
        );
        let value = serde_json::to_value(&application).unwrap();
        assert_eq!(value["apiVersion"], "appstudio.redhat.com/v1alpha1");
        assert_eq!(value["kind"], "Application");
        assert_eq!(value["spec"]["displayName"], "demo");
        assert!(value.get("status").is_none());
    }

    #[test]
    fn parses_component_from_server() {
        let component: Component = serde_json::from_value(serde_json::json!({
            "apiVersion": "appstudio.redhat.com/v1alpha1",
            "kind": "Component",
            "metadata": {"name": "nodejs", "namespace": "e2e"},
            "spec": {
                "componentName": "nodejs",
                "application": "demo",
                "source": {"git": {"url": "https://github.com/example/nodejs", "devfileUrl": "https://example.com/devfile.yaml"}},
                "replicas": 1,
                "someFieldWeDoNotModel": true
            },
            "status": {
                "conditions": [{"type": "Created", "status": "True", "reason": "OK"}],
                "containerImage": "quay.io/example/nodejs:latest"
            }
        }))
        .unwrap();

        let git = component.spec.source.git.as_ref().unwrap();
        assert_eq!(git.devfile_url, "https://example.com/devfile.yaml");
        assert_eq!(
            component.status.unwrap().container_image,
            "quay.io/example/nodejs:latest"
        );
    }
}
