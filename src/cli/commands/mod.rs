pub mod analysis;
pub mod car;
pub mod garage;
pub mod reading;
pub mod system;

use crate::cli::registry::CommandRegistry;

/// Every top-level command in the order `help` lists them.
pub(crate) fn registry() -> CommandRegistry {
    CommandRegistry::from_entries(
        garage::definitions()
            .into_iter()
            .chain(car::definitions())
            .chain(reading::definitions())
            .chain(analysis::definitions())
            .chain(system::definitions()),
    )
}

/// First argument lowercased, used as the subcommand name.
pub(crate) fn subcommand<'a>(args: &'a [&'a str]) -> Option<(String, &'a [&'a str])> {
    let (first, rest) = args.split_first()?;
    Some((first.to_lowercase(), rest))
}
