//! Reconciliation pass over a catalog library.
//!
//! Strictly sequential: shows, then seasons, then episodes, in catalog order.
//! Per season the pass runs fetch episodes → resolve season → apply season →
//! resolve and apply each episode. A failed update or listing is logged and
//! the pass moves on; only library discovery failures abort a run.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use plexmeta_api::{CatalogService, Episode, Season, Show};

use crate::change::{self, ChangeDecision};
use crate::error::PlexmetaError;
use crate::overrides::{OverrideSet, OverrideSource};
use crate::resolver;

/// Run-wide switches, fixed when the reconciler is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compute everything, send nothing; would-be updates report failure.
    pub dry_run: bool,
    /// Send updates even when the catalog already matches.
    pub always_modify: bool,
    pub max_episode_title_len: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            always_modify: false,
            max_episode_title_len: plexmeta_parse::DEFAULT_MAX_TITLE_LEN,
        }
    }
}

/// Result of reconciling one season or episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOutcome {
    Unchanged,
    Updated,
    UpdateFailed,
}

impl fmt::Display for EntityOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Updated => write!(f, "updated"),
            Self::UpdateFailed => write!(f, "update failed"),
        }
    }
}

/// Tally of a reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub shows: u32,
    pub seasons: u32,
    pub episodes: u32,
    pub unchanged: u32,
    pub updated: u32,
    pub failed: u32,
    /// Episodes without any backing media file.
    pub skipped: u32,
    /// Shows or seasons whose children could not be listed.
    pub listing_failures: u32,
    pub cancelled: bool,
}

impl PassReport {
    fn record(&mut self, outcome: EntityOutcome) {
        match outcome {
            EntityOutcome::Unchanged => self.unchanged += 1,
            EntityOutcome::Updated => self.updated += 1,
            EntityOutcome::UpdateFailed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Season,
    Episode,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Season => write!(f, "season"),
            Self::Episode => write!(f, "episode"),
        }
    }
}

/// Marker for a pass stopped by the cancellation token.
struct Cancelled;

/// Drives reconciliation against a catalog.
pub struct Reconciler<C, O> {
    catalog: C,
    overrides: O,
    options: ReconcileOptions,
    cancel: CancellationToken,
}

impl<C, O> Reconciler<C, O>
where
    C: CatalogService,
    O: OverrideSource,
{
    pub fn new(catalog: C, overrides: O, options: ReconcileOptions) -> Self {
        Self {
            catalog,
            overrides,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` to stop the pass between entity operations.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Reconcile every show with unwatched episodes in the named library.
    pub async fn run(&self, library_name: &str) -> Result<PassReport, PlexmetaError> {
        let mut report = PassReport::default();
        if self.options.dry_run {
            info!("Dry run: every update will be skipped and reported as failed");
        }

        if self.check_cancelled(&mut report).is_err() {
            return Ok(report);
        }
        let library = self
            .catalog
            .find_library(library_name)
            .await
            .map_err(|e| PlexmetaError::Catalog(e.to_string()))?;
        info!(library = %library.title, key = %library.key, "Found library");

        if self.check_cancelled(&mut report).is_err() {
            return Ok(report);
        }
        let shows = self
            .catalog
            .list_shows(&library.key)
            .await
            .map_err(|e| PlexmetaError::Catalog(e.to_string()))?;
        debug!(count = shows.len(), "Shows with unwatched episodes");

        for show in &shows {
            if self.reconcile_show(&library.key, show, &mut report).await.is_err() {
                break;
            }
        }

        info!(
            seasons = report.seasons,
            episodes = report.episodes,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Pass complete"
        );
        Ok(report)
    }

    async fn reconcile_show(
        &self,
        library_key: &str,
        show: &Show,
        report: &mut PassReport,
    ) -> Result<(), Cancelled> {
        self.check_cancelled(report)?;
        report.shows += 1;

        let seasons = match self.catalog.list_seasons(&show.key).await {
            Ok(s) => s,
            Err(e) => {
                warn!(show = %show.title, key = %show.key, error = %e, "Failed to list seasons");
                report.listing_failures += 1;
                return Ok(());
            }
        };

        info!(show = %show.title, seasons = seasons.len(), "Processing show");
        for season in &seasons {
            self.reconcile_season(library_key, season, report).await?;
        }
        Ok(())
    }

    async fn reconcile_season(
        &self,
        library_key: &str,
        season: &Season,
        report: &mut PassReport,
    ) -> Result<(), Cancelled> {
        // FetchEpisodes
        self.check_cancelled(report)?;
        report.seasons += 1;
        let episodes = match self.catalog.list_episodes(&season.key).await {
            Ok(e) => e,
            Err(e) => {
                warn!(season = %season.key, error = %e, "Failed to list episodes, skipping season");
                report.listing_failures += 1;
                return Ok(());
            }
        };
        info!(
            season = season.title.as_deref().unwrap_or_default(),
            key = %season.key,
            episodes = episodes.len(),
            "Season has unwatched episodes"
        );

        let overrides: Option<OverrideSet> = episodes
            .first()
            .and_then(Episode::primary_file)
            .and_then(|path| self.overrides.load(path));

        // ResolveSeasonMetadata
        let desired = resolver::resolve_season(overrides.as_ref(), &episodes);
        let decision = change::decide_with(&desired, season, self.options.always_modify);

        // ApplySeasonDecision
        let outcome = self
            .apply(
                Target::Season,
                library_key,
                &season.key,
                season.title.as_deref(),
                decision,
                report,
            )
            .await?;
        report.record(outcome);

        // ResolveAndApplyEachEpisode
        for episode in &episodes {
            report.episodes += 1;
            let Some(file) = episode.primary_file() else {
                info!(key = %episode.key, "No episode media found, skipping");
                report.skipped += 1;
                continue;
            };
            debug!(key = %episode.key, file = %file, "Processing episode");

            let desired = resolver::resolve_episode(
                overrides.as_ref(),
                episode,
                self.options.max_episode_title_len,
            );
            let decision = change::decide_with(&desired, episode, self.options.always_modify);
            let outcome = self
                .apply(
                    Target::Episode,
                    library_key,
                    &episode.key,
                    episode.title.as_deref(),
                    decision,
                    report,
                )
                .await?;
            report.record(outcome);
        }

        Ok(())
    }

    async fn apply(
        &self,
        target: Target,
        library_key: &str,
        key: &str,
        current_title: Option<&str>,
        decision: ChangeDecision,
        report: &mut PassReport,
    ) -> Result<EntityOutcome, Cancelled> {
        let patch = match decision {
            ChangeDecision::Unchanged => {
                info!(kind = %target, key, outcome = %EntityOutcome::Unchanged);
                return Ok(EntityOutcome::Unchanged);
            }
            ChangeDecision::Apply(patch) => patch,
        };

        self.check_cancelled(report)?;

        let success = if patch.is_empty() {
            // Nothing to set; the catalog treats this as a no-op.
            true
        } else if self.options.dry_run {
            debug!(kind = %target, key, ?patch, "Dry run, update not sent");
            false
        } else {
            let result = match target {
                Target::Season => self.catalog.update_season(library_key, key, &patch).await,
                Target::Episode => self.catalog.update_episode(library_key, key, &patch).await,
            };
            match result {
                Ok(()) => true,
                Err(e) => {
                    warn!(kind = %target, key, error = %e, "Update request failed");
                    false
                }
            }
        };

        let outcome = if success {
            EntityOutcome::Updated
        } else {
            EntityOutcome::UpdateFailed
        };
        let new_title = patch.title.as_deref().or(current_title).unwrap_or_default();
        if success {
            info!(
                kind = %target,
                key,
                old = current_title.unwrap_or_default(),
                new = new_title,
                outcome = %outcome
            );
        } else {
            warn!(
                kind = %target,
                key,
                old = current_title.unwrap_or_default(),
                new = new_title,
                outcome = %outcome
            );
        }
        Ok(outcome)
    }

    fn check_cancelled(&self, report: &mut PassReport) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            if !report.cancelled {
                info!("Cancelled, stopping pass");
            }
            report.cancelled = true;
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
