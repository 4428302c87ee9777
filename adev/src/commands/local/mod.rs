crate::cli_subcommands! {
    "Work against a cluster of your own

The cluster is the current context of your kubeconfig."

    mod cleanup_github_org,
    mod prepare_cluster,
    mod test_e2e,
}
