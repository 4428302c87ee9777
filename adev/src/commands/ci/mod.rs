crate::cli_subcommands! {
    "Steps of the Prow e2e jobs

The job is read from the environment Prow provides: `JOB_NAME`, `JOB_TYPE`, `JOB_SPEC`,
`REPO_OWNER`, `REPO_NAME`, `PULL_NUMBER`, `PULL_PULL_SHA` and `ARTIFACT_DIR`."

    mod prepare_e2e_branch,
    mod test_e2e,
}
