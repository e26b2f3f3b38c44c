//! Static raid catalog: zone keywords and boss rosters.

use std::collections::BTreeSet;

pub const UNKNOWN_RAID: &str = "Unknown Raid";

/// (raid name, lowercase keyword found in the zone name)
const RAID_ZONE_KEYWORDS: &[(&str, &str)] = &[
    ("Naxxramas", "naxxramas"),
    ("Onyxia's Lair", "onyxia"),
    ("Molten Core", "molten core"),
    ("Blackwing Lair", "blackwing lair"),
    ("Temple of Ahn'Qiraj", "ahn'qiraj temple"),
    ("Ruins of Ahn'Qiraj", "ruins of ahn'qiraj"),
    ("Zul'Gurub", "zul'gurub"),
];

const RAID_BOSSES: &[(&str, &[&str])] = &[
    (
        "Naxxramas",
        &[
            "Anub'Rekhan",
            "Grand Widow Faerlina",
            "Maexxna",
            "Noth the Plaguebringer",
            "Heigan the Unclean",
            "Loatheb",
            "Instructor Razuvious",
            "Gothik the Harvester",
            "The Four Horsemen",
            "Patchwerk",
            "Grobbulus",
            "Gluth",
            "Thaddius",
            "Sapphiron",
            "Kel'Thuzad",
        ],
    ),
    ("Onyxia's Lair", &["Onyxia"]),
    (
        "Molten Core",
        &[
            "Lucifron",
            "Magmadar",
            "Gehennas",
            "Garr",
            "Shazzrah",
            "Baron Geddon",
            "Golemagg the Incinerator",
            "Sulfuron Harbinger",
            "Majordomo Executus",
            "Ragnaros",
        ],
    ),
    (
        "Blackwing Lair",
        &[
            "Razorgore the Untamed",
            "Vaelastrasz the Corrupt",
            "Broodlord Lashlayer",
            "Firemaw",
            "Ebonroc",
            "Flamegor",
            "Chromaggus",
            "Nefarian",
        ],
    ),
    (
        "Temple of Ahn'Qiraj",
        &[
            "The Prophet Skeram",
            "Battleguard Sartura",
            "Fankriss the Unyielding",
            "Princess Huhuran",
            "Viscidus",
            "Twin Emperors",
            "Ouro",
            "C'Thun",
        ],
    ),
    (
        "Ruins of Ahn'Qiraj",
        &[
            "Kurinnaxx",
            "General Rajaxx",
            "Moam",
            "Buru the Gorger",
            "Ayamiss the Hunter",
            "Ossirian the Unscarred",
        ],
    ),
    (
        "Zul'Gurub",
        &[
            "High Priest Venoxis",
            "High Priestess Jeklik",
            "High Priestess Mar'li",
            "High Priest Thekal",
            "High Priestess Arlokk",
            "Jin'do the Hexxer",
            "Hakkar",
        ],
    ),
];

/// Map a zone name from the combat log onto a known raid.
pub fn zone_to_raid(zone_name: &str) -> Option<&'static str> {
    let zone = zone_name.trim().to_lowercase();
    if let Some((raid, _)) = RAID_ZONE_KEYWORDS
        .iter()
        .find(|(_, keyword)| zone.contains(keyword))
    {
        return Some(*raid);
    }
    if zone.contains("aq20") {
        return Some("Ruins of Ahn'Qiraj");
    }
    if zone.contains("aq40") {
        return Some("Temple of Ahn'Qiraj");
    }
    None
}

pub fn bosses_of(raid: &str) -> Option<&'static [&'static str]> {
    RAID_BOSSES
        .iter()
        .find(|(name, _)| *name == raid)
        .map(|(_, bosses)| *bosses)
}

pub fn is_boss(raid: &str, target: &str) -> bool {
    bosses_of(raid).is_some_and(|bosses| bosses.contains(&target))
}

/// Raid whose boss list matches the most distinct fight targets; on equal hits
/// the earlier catalog entry wins.
pub fn infer_raid_from_targets<'a>(targets: impl IntoIterator<Item = &'a str>) -> Option<&'static str> {
    let targets: BTreeSet<&str> = targets.into_iter().collect();
    let mut best: Option<(&'static str, usize)> = None;
    for (raid, bosses) in RAID_BOSSES {
        let hits = bosses.iter().filter(|b| targets.contains(*b)).count();
        if hits > best.map(|(_, h)| h).unwrap_or(0) {
            best = Some((*raid, hits));
        }
    }
    best.map(|(raid, _)| raid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zones_map_to_raids() {
        assert_eq!(zone_to_raid("Naxxramas"), Some("Naxxramas"));
        assert_eq!(zone_to_raid("  Onyxia's Lair "), Some("Onyxia's Lair"));
        assert_eq!(zone_to_raid("AQ40"), Some("Temple of Ahn'Qiraj"));
        assert_eq!(zone_to_raid("Ahn'Qiraj Temple"), Some("Temple of Ahn'Qiraj"));
        assert_eq!(zone_to_raid("Orgrimmar"), None);
    }

    #[test]
    fn raid_is_inferred_from_boss_hits() {
        let targets = ["Patchwerk", "Gluth", "Onyxia", "Unknown"];
        assert_eq!(infer_raid_from_targets(targets), Some("Naxxramas"));
        assert_eq!(infer_raid_from_targets(["Hogger"]), None);
        assert_eq!(infer_raid_from_targets(std::iter::empty()), None);
    }

    #[test]
    fn boss_lookup() {
        assert!(is_boss("Molten Core", "Ragnaros"));
        assert!(!is_boss("Molten Core", "Core Hound"));
        assert!(!is_boss("Unknown Raid", "Ragnaros"));
    }
}
