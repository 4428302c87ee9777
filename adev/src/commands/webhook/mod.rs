crate::cli_subcommands! {
    "Report e2e runs to the webhook receiver"
    mod send,
}
