use colored::Colorize;
use rfx_solver::ReflectError;

use super::driver::{Description, MemberLine, Outcome};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    pub fn render(&self, outcome: &Outcome) -> String {
        match outcome {
            Outcome::Inherits {
                ty,
                target,
                inherits,
            } => {
                let verdict = if *inherits {
                    self.paint_good("inherits")
                } else {
                    self.paint_bad("does not inherit")
                };
                format!("{} {} {}", self.paint_type(ty), verdict, self.paint_type(target))
            }
            Outcome::GenericArgs {
                ty,
                definition,
                arguments,
            } => {
                let mut out = format!(
                    "{} as {}:",
                    self.paint_type(ty),
                    self.paint_type(definition)
                );
                if arguments.is_empty() {
                    out.push_str(" (none)");
                }
                for list in arguments {
                    out.push_str("\n  <");
                    out.push_str(&list.join(", "));
                    out.push('>');
                }
                out
            }
            Outcome::Resolved {
                ty,
                inherited,
                resolved,
            } => format!(
                "{} resolved against {}: {}",
                self.paint_type(ty),
                self.paint_type(inherited),
                self.paint_good(resolved)
            ),
            Outcome::Members { ty, members } => self.render_members(ty, members),
            Outcome::Described(description) => self.render_description(description),
        }
    }

    pub fn render_json(&self, outcome: &Outcome) -> serde_json::Result<String> {
        serde_json::to_string_pretty(outcome)
    }

    pub fn render_error(&self, error: &ReflectError) -> String {
        let category = format!("{:?}", error.kind()).to_lowercase();
        let category = if self.color {
            category.red().bold().to_string()
        } else {
            category
        };
        format!("error[{category}]: {error}")
    }

    fn render_members(&self, ty: &str, members: &[MemberLine]) -> String {
        let mut out = format!("{} ({} members)", self.paint_type(ty), members.len());
        for member in members {
            let modifiers = if member.is_static {
                format!("{} static", member.visibility)
            } else {
                member.visibility.clone()
            };
            out.push_str(&format!(
                "\n  {:<11} {:<17} {}",
                member.kind,
                self.paint_dim(&modifiers),
                member.signature
            ));
        }
        out
    }

    fn render_description(&self, d: &Description) -> String {
        let mut out = self.paint_type(&d.name);
        if let Some(kind) = &d.kind {
            out.push_str(&format!(" ({})", kind.to_lowercase()));
        }
        let flags = [
            (d.is_generic_definition, "generic definition"),
            (d.contains_generic_parameters, "open"),
        ];
        for (set, label) in flags {
            if set {
                out.push_str(&format!("\n  {}", self.paint_dim(label)));
            }
        }
        if !d.generic_arguments.is_empty() {
            out.push_str(&format!("\n  arguments: {}", d.generic_arguments.join(", ")));
        }
        if let Some(base) = &d.base_type {
            out.push_str(&format!("\n  base: {base}"));
        }
        for iface in &d.interfaces {
            out.push_str(&format!("\n  implements {iface}"));
        }
        out
    }

    fn paint_type(&self, name: &str) -> String {
        if self.color {
            name.cyan().to_string()
        } else {
            name.to_string()
        }
    }

    fn paint_good(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_bad(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint_dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}
