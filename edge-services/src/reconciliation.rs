//! Source reconciliation
//!
//! Combines the authoritative status feed with the market-presence signal
//! (and any secondary reporters) into one [`ConsensusVerdict`] per player.
//! Market presence never upgrades an explicit negative status to available;
//! it only turns it into an uncertain verdict for review.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

use edge_core::{
    AvailabilityFact, AvailabilityStatus, ConsensusVerdict, MarketPresence, MarketQuote,
    SourceId, StatusReport, StatusSignal, VerdictStatus,
};

/// How uncertain verdicts are consumed downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationPolicy {
    /// Exclude uncertain players from forecasts and count them in impact
    pub uncertain_as_unavailable: bool,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            uncertain_as_unavailable: true,
        }
    }
}

impl ReconciliationPolicy {
    /// Whether a verdict takes the unavailable branch
    pub fn treats_as_unavailable(&self, verdict: &ConsensusVerdict) -> bool {
        match verdict.status {
            VerdictStatus::Unavailable => true,
            VerdictStatus::Uncertain => self.uncertain_as_unavailable,
            VerdictStatus::Available => false,
        }
    }
}

/// Reconcile the two primary signals for one player
///
/// `status` is `None` when the player is absent from the status feed, which
/// means available.
pub fn reconcile(
    player_id: &str,
    status: Option<AvailabilityStatus>,
    presence: MarketPresence,
) -> ConsensusVerdict {
    let market_known = presence != MarketPresence::Unknown;
    let sources_consulted = 1 + market_known as u8;
    let signal = status.map(|s| s.signal()).unwrap_or(StatusSignal::Available);

    let (status, agreement, rationale) = match (signal, presence) {
        (StatusSignal::Unavailable, MarketPresence::Absent) => (
            VerdictStatus::Unavailable,
            2,
            "listed unavailable and no line is quoted".to_string(),
        ),
        (StatusSignal::Unavailable, MarketPresence::Unknown) => (
            VerdictStatus::Unavailable,
            1,
            "listed unavailable, market signal unavailable".to_string(),
        ),
        (StatusSignal::Unavailable, MarketPresence::Present) => (
            VerdictStatus::Uncertain,
            1,
            "listed unavailable but a line is still quoted".to_string(),
        ),
        (StatusSignal::Doubtful, MarketPresence::Absent) => (
            VerdictStatus::Uncertain,
            1,
            "listed doubtful and no line is quoted".to_string(),
        ),
        (StatusSignal::Doubtful, _) => (
            VerdictStatus::Uncertain,
            0,
            "listed doubtful".to_string(),
        ),
        (StatusSignal::Available, MarketPresence::Present) => (
            VerdictStatus::Available,
            2,
            "not listed and a line is quoted".to_string(),
        ),
        (StatusSignal::Available, MarketPresence::Absent) => (
            VerdictStatus::Available,
            1,
            "not listed, no line quoted".to_string(),
        ),
        (StatusSignal::Available, MarketPresence::Unknown) => (
            VerdictStatus::Available,
            1,
            "not listed".to_string(),
        ),
    };

    ConsensusVerdict {
        player_id: player_id.to_string(),
        status,
        agreement,
        sources_consulted,
        rationale,
    }
}

fn presence_from_signal(signal: StatusSignal) -> MarketPresence {
    match signal {
        StatusSignal::Available => MarketPresence::Present,
        StatusSignal::Unavailable => MarketPresence::Absent,
        StatusSignal::Doubtful => MarketPresence::Unknown,
    }
}

fn supports(verdict: VerdictStatus, signal: StatusSignal) -> bool {
    match verdict {
        VerdictStatus::Available => signal == StatusSignal::Available,
        VerdictStatus::Unavailable => signal == StatusSignal::Unavailable,
        VerdictStatus::Uncertain => signal != StatusSignal::Available,
    }
}

/// Reconcile an arbitrary set of observations for one player
///
/// The latest fact per source wins. Status feed and market presence follow
/// [`reconcile`]; each secondary reporter that supports the verdict adds one
/// to the agreement count, and a secondary report of unavailability turns an
/// available verdict uncertain.
pub fn reconcile_facts(player_id: &str, facts: &[AvailabilityFact]) -> ConsensusVerdict {
    let mut latest: BTreeMap<SourceId, &AvailabilityFact> = BTreeMap::new();
    for fact in facts.iter().filter(|f| f.player_id == player_id) {
        match latest.get(&fact.source) {
            Some(current) if current.observed_at >= fact.observed_at => {}
            _ => {
                latest.insert(fact.source, fact);
            }
        }
    }

    let status = latest.get(&SourceId::StatusFeed).map(|f| match f.status {
        StatusSignal::Available => AvailabilityStatus::Active,
        StatusSignal::Doubtful => AvailabilityStatus::Questionable,
        StatusSignal::Unavailable => AvailabilityStatus::Out,
    });
    let presence = latest
        .get(&SourceId::MarketPresence)
        .map(|f| presence_from_signal(f.status))
        .unwrap_or(MarketPresence::Unknown);

    let mut verdict = reconcile(player_id, status, presence);

    if let Some(secondary) = latest.get(&SourceId::Secondary) {
        verdict.sources_consulted += 1;

        if verdict.status == VerdictStatus::Available
            && secondary.status == StatusSignal::Unavailable
        {
            verdict.status = VerdictStatus::Uncertain;
            verdict.agreement = 1;
            verdict.rationale = format!("{}; secondary reporter lists unavailable", verdict.rationale);
        } else if supports(verdict.status, secondary.status) {
            verdict.agreement += 1;
            verdict.rationale = format!("{}; confirmed by secondary reporter", verdict.rationale);
        }
    }

    verdict
}

/// Verdicts for every player on a team
///
/// Each status-feed entry becomes a fact observed at its `updated_at` (or
/// now), so the latest entry wins when the feed lists a player twice.
/// `quotes` is `None` when the market could not be read, which makes the
/// presence signal unknown rather than absent. Players listed in the status
/// feed but missing from the roster are included.
pub fn reconcile_scope(
    team: &str,
    roster: &[String],
    reports: &[StatusReport],
    quotes: Option<&[MarketQuote]>,
) -> Vec<ConsensusVerdict> {
    let now = Utc::now();

    let mut facts: HashMap<&str, Vec<AvailabilityFact>> = HashMap::new();
    for report in reports.iter().filter(|r| r.team == team) {
        facts
            .entry(report.player_id.as_str())
            .or_default()
            .push(AvailabilityFact {
                player_id: report.player_id.clone(),
                source: SourceId::StatusFeed,
                status: report.status.signal(),
                observed_at: report.updated_at.unwrap_or(now),
            });
    }

    let quoted: Option<BTreeSet<&str>> =
        quotes.map(|qs| qs.iter().map(|q| q.player_id.as_str()).collect());

    let players: BTreeSet<&str> = roster
        .iter()
        .map(String::as_str)
        .chain(reports.iter().filter(|r| r.team == team).map(|r| r.player_id.as_str()))
        .collect();

    let verdicts: Vec<ConsensusVerdict> = players
        .into_iter()
        .map(|player_id| {
            let mut player_facts = facts.remove(player_id).unwrap_or_default();
            if let Some(set) = &quoted {
                player_facts.push(AvailabilityFact {
                    player_id: player_id.to_string(),
                    source: SourceId::MarketPresence,
                    status: if set.contains(player_id) {
                        StatusSignal::Available
                    } else {
                        StatusSignal::Unavailable
                    },
                    observed_at: now,
                });
            }
            reconcile_facts(player_id, &player_facts)
        })
        .collect();

    debug!(
        "Reconciled {} players for {} ({} not available)",
        verdicts.len(),
        team,
        verdicts
            .iter()
            .filter(|v| v.status != VerdictStatus::Available)
            .count()
    );

    verdicts
}
