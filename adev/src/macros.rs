macro_rules! display {
    ($($arg:tt)*) => {{
        use owo_colors::OwoColorize;
        println!(
            "{}",
            format!($($arg)*)
                .if_supports_color(owo_colors::Stream::Stdout, |text| text.bold())
        );
    }};
}

macro_rules! critical {
    ($($arg:tt)*) => {{
        use owo_colors::OwoColorize;
        eprintln!(
            "{}",
            format!($($arg)*)
                .if_supports_color(owo_colors::Stream::Stderr, |text| text.bright_red())
        );
    }};
}

macro_rules! define_display_macro {
    // https://github.com/rust-lang/rust/issues/35853#issuecomment-415993963
    ($name:ident, $level:ident, $style:ident, $d:tt) => (
        #[allow(unused_macros)]
        macro_rules! $name {
            ($d($d arg:tt)*) => {{
                use owo_colors::OwoColorize;
                if log::Level::$level <= $crate::app::verbosity() {
                    eprintln!(
                        "{}",
                        format!($d($d arg)*)
                            .if_supports_color(owo_colors::Stream::Stderr, |text| text.$style())
                    );
                }
            }};
        }
    );
}

// Simply bold rather than bright white for terminals with white backgrounds
define_display_macro!(debug, Debug, bold, $);
define_display_macro!(info, Info, bold, $);
define_display_macro!(success, Info, bright_cyan, $);
define_display_macro!(waiting, Info, bright_magenta, $);
define_display_macro!(warning, Warn, bright_yellow, $);

/// Builds the `Commands` enum dispatching to each listed module's `Cli`.
///
/// Modules prefixed with `mod` are declared as well.
#[macro_export]
macro_rules! cli_commands {
    ( :: $( $list:ident, )* :: mod $mod:ident, $( $rest:tt )* ) => {
        mod $mod;
        $crate::cli_commands! { :: $( $list, )* $mod, :: $( $rest )* }
    };
    ( :: $( $list:ident, )* :: $mod:ident, $( $rest:tt )* ) => {
        $crate::cli_commands! { :: $( $list, )* $mod, :: $( $rest )* }
    };
    ( :: $( $mod:ident, )* :: ) => {
        paste::paste! {
            #[derive(clap::Subcommand, Debug)]
            enum Commands {
                $( [<$mod:camel>]($mod::Cli), )*
            }

            impl Commands {
                fn exec(self) -> anyhow::Result<()> {
                    match self {
                        $( Self::[<$mod:camel>](cli) => cli.exec(), )*
                    }
                }
            }
        }
    };
    ( $( $rest:tt )+ ) => { $crate::cli_commands! { :: :: $( $rest )+ } };
}

/// A command group: a documented `Cli` holding one of the listed subcommands.
#[macro_export]
macro_rules! cli_subcommands {
    ($doc:literal $( $rest:tt )* ) => {
        #[derive(clap::Args, Debug)]
        #[doc = $doc]
        #[command()]
        pub(super) struct Cli {
            #[command(subcommand)]
            command: Commands,
        }

        impl Cli {
            pub(super) fn exec(self) -> anyhow::Result<()> {
                self.command.exec()
            }
        }

        $crate::cli_commands! { $( $rest )* }
    };
}
