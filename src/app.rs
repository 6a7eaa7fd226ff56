use anyhow::bail;
use tracing::info;

use crate::flags;
use crate::flags::FlagSet;
use crate::inventory::HostEntry;
use crate::launch;
use crate::plan::ConnectionPlan;
use crate::resolve::{resolve, Resolution};
use crate::selector;
use crate::settings::GlobalSettings;

pub struct App {
    settings: GlobalSettings,
    inventory: Vec<HostEntry>,
}

impl App {
    pub fn new(settings: GlobalSettings, inventory: Vec<HostEntry>) -> Self {
        App {
            settings,
            inventory,
        }
    }

    /// One attempt from a command-line argument. Ambiguity is fatal here;
    /// there is no loop to fall back into.
    pub fn run_direct(&self, input: &str) -> anyhow::Result<i32> {
        let (flags, query) = flags::parse(input);
        if query.is_empty() {
            bail!("no host given");
        }
        let resolution = resolve(query, &self.inventory)?;
        self.finish(resolution, flags)
    }

    /// Select, resolve, connect. An ambiguous pick shows the candidates and
    /// returns to the selection loop; cancel exits cleanly.
    pub fn run_interactive(&self) -> anyhow::Result<i32> {
        let mut selector = selector::for_environment(self.inventory.clone());
        loop {
            let Some(request) = selector.select()? else {
                return Ok(0);
            };
            match resolve(&request.query, &self.inventory) {
                Ok(resolution) => return self.finish(resolution, request.flags),
                Err(ambiguous) => {
                    eprintln!("{ambiguous}");
                    acknowledge();
                    continue;
                }
            }
        }
    }

    fn finish(&self, resolution: Resolution, flags: FlagSet) -> anyhow::Result<i32> {
        if let Resolution::Literal(entry) = &resolution {
            info!(host = %entry.host, "no inventory match, dialing literally");
        }
        let plan = ConnectionPlan::build(&self.settings, resolution.entry(), &flags);
        if plan.dry_run {
            println!("{}", plan.command_line());
            return Ok(0);
        }
        match plan.jump_spec() {
            Some(jump_spec) => println!(
                "Using jumphost {jump_spec} -> {}:{}",
                plan.target_spec(),
                plan.target_port
            ),
            None => println!(
                "Connecting directly to {}:{}",
                plan.target_spec(),
                plan.target_port
            ),
        }
        launch::launch(&plan)
    }
}

// the selection screen repaints immediately, so give the candidate list a
// moment on screen
fn acknowledge() {
    eprint!("press Enter to continue");
    let _ = std::io::stdin().read_line(&mut String::new());
}
