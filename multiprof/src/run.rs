use anyhow::Context;
use dialoguer::{Confirm, console::Term};
use std::{io::Write, path::PathBuf, time::Duration};

use crate::{
    command::{CreateArgs, GcOptions, Interactive, ListOptions, RemoveOptions},
    config::Config,
    current::Current,
    model::{GcEntry, Profile},
    store::{CreateOptions, OpenOptions, ProfileStore},
    utils::format_duration_short,
};

/// Executes commands of the binary against one registry
#[derive(Debug)]
pub struct RunContext {
    config: Config,
    store: ProfileStore,
    current: Current,
    term: Term,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Action {
    Remove,
    AboutToRemove,
    Ignored,
    Collect,
}

impl RunContext {
    /// Opens the registry, migrating it first unless disabled in `config`.
    pub fn new(config: Config, directory: Option<PathBuf>) -> anyhow::Result<Self> {
        let directory = directory.unwrap_or_else(|| config.directory.clone());
        let store = if config.migrate {
            ProfileStore::migrate_with(&directory, &config.legacy)
        } else {
            ProfileStore::open(&directory, OpenOptions::default())
        }
        .with_context(|| format!("failed to open registry {directory:?}"))?;
        Ok(Self {
            config,
            store,
            current: Current::new(),
            term: Term::stderr(),
        })
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn list(&self, options: &ListOptions) -> anyhow::Result<()> {
        let mut out = Term::stdout();
        for profile in self.store.list() {
            writeln!(out, "{}", self.format_profile(profile))?;
        }
        if options.gc {
            for entry in self.store.pending() {
                writeln!(out, "{}", self.format_pending(entry))?;
            }
        }
        Ok(())
    }

    pub fn active(&self) -> anyhow::Result<()> {
        match self.store.active() {
            Some(profile) => writeln!(Term::stdout(), "{}", self.format_profile(profile))?,
            None => log::info!("no active profile"),
        }
        Ok(())
    }

    pub fn migrate(&mut self) -> anyhow::Result<()> {
        let directory = self.store.directory().to_path_buf();
        self.store = ProfileStore::migrate_with(&directory, &self.config.legacy)
            .with_context(|| format!("failed to migrate {directory:?}"))?;
        match self.store.active() {
            Some(profile) => log::info!("active profile: {}", profile.id),
            None => log::info!("no active profile"),
        }
        Ok(())
    }

    pub fn create(&mut self, args: CreateArgs) -> anyhow::Result<()> {
        let CreateArgs { name, id, inactive } = args;
        let create = CreateOptions {
            active: !inactive,
            id,
            name,
            created: Some(self.current.timestamp()),
        };
        match self.store.create(create).context("failed to create profile")? {
            Some(profile) => writeln!(Term::stdout(), "{}", self.format_profile(&profile))?,
            None => log::warn!("profile {} already exists", id.unwrap_or_default()),
        }
        Ok(())
    }

    pub fn update(&mut self, id: u64, active: bool) -> anyhow::Result<()> {
        match self
            .store
            .update(id, active)
            .with_context(|| format!("failed to update profile {id}"))?
        {
            Some(profile) => writeln!(Term::stdout(), "{}", self.format_profile(&profile))?,
            None => log::warn!("profile {id} not found"),
        }
        Ok(())
    }

    pub fn remove(&mut self, options: RemoveOptions) -> anyhow::Result<()> {
        let mut waiting = Vec::new();
        for id in options.ids {
            let Some(profile) = self.store.get(id).cloned() else {
                log::warn!("profile {id} not found");
                continue;
            };
            match options.interactive {
                Interactive::Always => {
                    self.notify_action(&profile, Action::AboutToRemove)?;
                    if self.prompt_continue()? {
                        self.remove_profile(&profile)?;
                    } else {
                        self.notify_action(&profile, Action::Ignored)?;
                    }
                }
                Interactive::Once => {
                    self.notify_action(&profile, Action::AboutToRemove)?;
                    waiting.push(profile);
                }
                Interactive::Never => self.remove_profile(&profile)?,
            }
        }

        if !waiting.is_empty() && self.prompt_continue()? {
            for profile in &waiting {
                self.remove_profile(profile)?;
            }
        }
        Ok(())
    }

    pub fn gc(&mut self, options: GcOptions) -> anyhow::Result<()> {
        let delay = options.delay.unwrap_or(self.config.gc_delay);
        log::debug!("collecting with delay {}", humantime::format_duration(delay));
        let report = self
            .store
            .collect_at(delay, &self.current)
            .context("failed to collect removed profiles")?;
        for entry in &report.entries {
            self.notify_collect(entry)?;
        }
        if !options.no_statistic {
            let mut term = &self.term;
            writeln!(
                term,
                "{}",
                term.style().bold().underlined().apply_to("Statistics")
            )?;
            term.write_line(&report.format_with_style(term))?;
        }
        Ok(())
    }

    fn remove_profile(&mut self, profile: &Profile) -> anyhow::Result<()> {
        self.notify_action(profile, Action::Remove)?;
        self.store
            .remove_at(profile.id, self.current.timestamp())
            .with_context(|| format!("failed to remove profile {}", profile.id))?;
        Ok(())
    }

    fn prompt_continue(&self) -> anyhow::Result<bool> {
        Confirm::new()
            .with_prompt("Do you want to continue?")
            .report(false)
            .default(false)
            .interact_on(&self.term)
            .context("failed to prompt")
    }

    fn notify_action(&self, profile: &Profile, action: Action) -> anyhow::Result<()> {
        let mut term = &self.term;
        writeln!(
            term,
            "{action} {}",
            self.format_profile(profile),
            action = action.format_with_style(term),
        )?;
        Ok(())
    }

    fn notify_collect(&self, entry: &GcEntry) -> anyhow::Result<()> {
        let mut term = &self.term;
        let age = self
            .current
            .now
            .duration_since(entry.removed.to_system_time())
            .unwrap_or_else(|_| Duration::new(0, 0));
        writeln!(
            term,
            "{action} {:?} (removed {age} ago)",
            self.store.storage(entry.id),
            action = Action::Collect.format_with_style(term),
            age = term.style().bold().apply_to(format_duration_short(age)),
        )?;
        Ok(())
    }

    fn format_profile(&self, profile: &Profile) -> String {
        let marker = if profile.active { "*" } else { " " };
        format!(
            "{marker} {:>4}  {:<16} created {}  {:?}",
            profile.id,
            profile.name.as_deref().unwrap_or("-"),
            profile.created,
            self.store.storage(profile.id)
        )
    }

    fn format_pending(&self, entry: &GcEntry) -> String {
        format!(
            "- {:>4}  {:<16} removed {}  {:?}",
            entry.id,
            entry.name.as_deref().unwrap_or("-"),
            entry.removed,
            self.store.storage(entry.id)
        )
    }
}

impl Action {
    fn format_with_style(&self, term: &Term) -> String {
        match self {
            Action::Remove => term.style().green().bold().apply_to("Remove").to_string(),
            Action::AboutToRemove => term
                .style()
                .blue()
                .bold()
                .apply_to("About to remove")
                .to_string(),
            Action::Ignored => term.style().cyan().bold().apply_to("Ignore").to_string(),
            Action::Collect => term.style().red().bold().apply_to("Collect").to_string(),
        }
    }
}
