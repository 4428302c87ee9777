crate::cli_subcommands! {
    "Patch Tekton bundles for pull requests under test"
    mod patch_java,
}
