//! Best-effort correlation data pulled from the combat log.
//!
//! The combat log grammar is only sampled, not parsed: a handful of line
//! shapes give the raid zone, the guild roster, role hints and boss deaths.

use crate::Result;
use crate::diagnostics::{Diagnostics, Staged};
use crate::locate::CombatLogSource;
use crate::raid;

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const TAUNT_ABILITIES: &[&str] = &[
    "Taunt",
    "Growl",
    "Mocking Blow",
    "Challenging Shout",
    "Challenging Roar",
];

const TANK_ABILITIES: &[&str] = &[
    "Sunder Armor",
    "Revenge",
    "Shield Slam",
    "Shield Block",
    "Demoralizing Shout",
    "Righteous Fury",
    "Holy Shield",
    "Defensive Stance",
    "Bear Form",
    "Dire Bear Form",
    "Maul",
    "Swipe",
];

/// Substrings of spell names that mark a heal.
const HEALING_SPELL_HINTS: &[&str] = &[
    "Heal",
    "Flash Heal",
    "Greater Heal",
    "Prayer of Healing",
    "Renew",
    "Rejuvenation",
    "Regrowth",
    "Healing Touch",
    "Lesser Healing Wave",
    "Chain Heal",
    "Holy Light",
    "Flash of Light",
    "Swiftmend",
];

/// Per-player counts used to guess a role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleSignals {
    pub heals: u32,
    pub taunts: u32,
    pub tank_abilities: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatLogInsights {
    /// First zone that maps onto a known raid.
    pub raid_zone: Option<String>,
    /// player -> guild
    pub roster: BTreeMap<String, String>,
    pub role_signals: BTreeMap<String, RoleSignals>,
    /// Units seen dying anywhere in the log.
    pub deaths: BTreeSet<String>,
}

impl CombatLogInsights {
    /// Players whose recorded guild is one of `guilds`.
    pub fn guild_members(&self, guilds: &[String]) -> BTreeSet<String> {
        self.roster
            .iter()
            .filter(|(_, guild)| guilds.iter().any(|g| g == *guild))
            .map(|(player, _)| player.clone())
            .collect()
    }

    pub fn signals_for(&self, player: &str) -> RoleSignals {
        self.role_signals.get(player).copied().unwrap_or_default()
    }

    pub fn saw_death(&self, unit: &str) -> bool {
        self.deaths.contains(unit)
    }
}

/// Compiled line matchers for one pass over the combat log.
pub struct CombatLogScanner {
    combatant: Regex,
    casts: Regex,
    gains: Regex,
    heals: Regex,
    dies: Regex,
}

impl CombatLogScanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            // ...&name&CLASS&Race&level&...&guild&
            combatant: Regex::new(
                r"COMBATANT_INFO:.*?&([^&]+)&[A-Z]+&[A-Za-z]+&\d+&[^&]*&([^&]+)&",
            )?,
            casts: Regex::new(r"\s([A-Za-z][A-Za-z'\-]+) casts ([^.]+?)(?: on [^.]+)?\.")?,
            gains: Regex::new(r"\s([A-Za-z][A-Za-z'\-]+) gains ([^.]+)\.")?,
            heals: Regex::new(r"\s([A-Za-z][A-Za-z'\-]+)(?:'s [^.]+)? heals ")?,
            dies: Regex::new(r"^\S+\s+\S+\s+(.+?) dies\.\s*$")?,
        })
    }

    pub fn scan(&self, text: &str) -> CombatLogInsights {
        let mut out = CombatLogInsights::default();

        for line in text.lines() {
            if out.raid_zone.is_none() && line.contains("ZONE_INFO:") {
                if let Some(zone) = line.split('&').nth(1) {
                    out.raid_zone = raid::zone_to_raid(zone).map(str::to_string);
                }
                continue;
            }

            if line.contains("COMBATANT_INFO:") {
                if let Some(c) = self.combatant.captures(line) {
                    out.roster
                        .insert(c[1].trim().to_string(), c[2].trim().to_string());
                }
                continue;
            }

            if let Some(c) = self.heals.captures(line) {
                signals(&mut out, &c[1]).heals += 1;
            }

            if let Some(c) = self.casts.captures(line) {
                let spell = c[2].trim();
                let s = signals(&mut out, &c[1]);
                if TAUNT_ABILITIES.contains(&spell) {
                    s.taunts += 1;
                }
                if TANK_ABILITIES.contains(&spell) {
                    s.tank_abilities += 1;
                }
                if HEALING_SPELL_HINTS.iter().any(|h| spell.contains(h)) {
                    s.heals += 1;
                }
            }

            if let Some(c) = self.gains.captures(line) {
                let aura = c[2].trim();
                if TANK_ABILITIES.contains(&aura) {
                    signals(&mut out, &c[1]).tank_abilities += 1;
                }
            }

            if let Some(c) = self.dies.captures(line) {
                out.deaths.insert(c[1].trim().to_string());
            }
        }

        out
    }
}

fn signals<'a>(out: &'a mut CombatLogInsights, player: &str) -> &'a mut RoleSignals {
    out.role_signals.entry(player.to_string()).or_default()
}

/// Read and scan the combat log; a missing or unreadable log yields `None`.
pub fn load_combat_log(source: &CombatLogSource) -> Result<Staged<Option<CombatLogInsights>>> {
    let Some(text) = source.read_lossy() else {
        return Ok(Staged::new(
            None,
            Diagnostics {
                combat_log_unavailable: true,
                ..Default::default()
            },
        ));
    };

    let insights = CombatLogScanner::new()?.scan(&text);
    log::debug!(
        "combat log {}: raid zone {:?}, {} roster entries, {} deaths",
        source.path.display(),
        insights.raid_zone,
        insights.roster.len(),
        insights.deaths.len()
    );
    Ok(Staged::new(Some(insights), Diagnostics::default()))
}
