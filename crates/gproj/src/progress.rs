use colored::Colorize;
use gproj_cloud::{Event, Progress};

/// Prints engine narration to stdout
pub struct ConsolePrinter;

impl Progress for ConsolePrinter {
    fn event(&self, event: Event) {
        let text = event.to_string();
        match event {
            Event::ProjectCreated { .. }
            | Event::ProjectUpdated { .. }
            | Event::BillingServiceEnabled
            | Event::BillingUpdated
            | Event::CatalogStored { .. } => println!("{} {}", "✓".green(), text.green()),
            Event::ServicesUpToDate => println!("{} {}", "✓".green(), text.dimmed()),
            Event::ProjectMissing { .. } | Event::AssumedServiceName { .. } => {
                println!("{}", text.yellow())
            }
            Event::CacheWarning { .. } => eprintln!("{}", text.yellow()),
            Event::EnablingServices { .. } | Event::UpdatingBilling { .. } => {
                println!("{}", text.cyan())
            }
            Event::LookingUpBillingAccounts
            | Event::BillingAccountSelected { .. }
            | Event::FetchingCatalog => println!("{}", text),
        }
    }
}
