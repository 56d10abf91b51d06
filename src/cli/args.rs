use clap::{Parser, Subcommand, ValueEnum};
use rfx_solver::MemberKinds;

/// CLI arguments for the rfx binary.
#[derive(Parser, Debug)]
#[command(
    name = "rfx",
    version,
    about = "Query generic-aware type relationships over a reflected type graph"
)]
pub struct CliArgs {
    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Leave the demo dictionary interfaces out of the type graph.
    #[arg(long = "no-demo", global = true)]
    pub no_demo: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check whether TYPE structurally inherits TARGET (open targets allowed).
    Inherits { ty: String, target: String },

    /// Print the argument lists TYPE instantiates DEFINITION with.
    #[command(name = "generic-args")]
    GenericArgs {
        ty: String,
        definition: String,
        /// Print every distinct list instead of requiring a single one.
        #[arg(long)]
        all: bool,
    },

    /// Re-close TYPE's definition so that it inherits INHERITED.
    Resolve { ty: String, inherited: String },

    /// List members of TYPE, optionally filtered by NAME.
    Members {
        ty: String,
        name: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Include non-public members.
        #[arg(long = "non-public")]
        non_public: bool,
        /// Select static members instead of instance members.
        #[arg(long = "static")]
        static_members: bool,
        #[arg(long = "ignore-case")]
        ignore_case: bool,
        /// Select generic methods with this many type parameters.
        #[arg(long)]
        arity: Option<usize>,
    },

    /// Show a type's position in the graph.
    Describe { ty: String },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Field,
    Property,
    Method,
    Constructor,
    #[value(name = "property-or-field")]
    PropertyOrField,
}

impl KindArg {
    pub fn kinds(self) -> MemberKinds {
        match self {
            Self::Field => MemberKinds::FIELD,
            Self::Property => MemberKinds::PROPERTY,
            Self::Method => MemberKinds::METHOD,
            Self::Constructor => MemberKinds::CONSTRUCTOR,
            Self::PropertyOrField => MemberKinds::PROPERTY_OR_FIELD,
        }
    }
}
