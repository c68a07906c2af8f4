// src/catalog.rs
//! Reference catalog (known entities, aliases, overrides) and the cosmetic
//! item catalog assembled from table rows.
//!
//! Owner resolution for one row `[owner cell, item name, release cell]`:
//! 1. owner cell naming a known entity
//! 2. explicit override for the item name
//! 3. longest known entity name appearing as a word in the item name (`Ahri's` counts)
//! 4. owner-hint phrase table
//! 5. a single word of the item name that is a known alias
//!
//! Anything else is kept with `owner = None` for the attribution engine.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::attribution::{contains_word, default_prefixes, OverrideStore};
use crate::date::{normalize_date, release_year, resolve_date, UNKNOWN_DATE};
use crate::types::CosmeticItem;

/// Injected reference data. Every field falls back to the built-in seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceCatalog {
    pub known_entities: Vec<String>,
    /// Alias text (lower case) → entity name.
    pub aliases: BTreeMap<String, String>,
    /// Exact item name → entity name.
    pub overrides: BTreeMap<String, String>,
    /// Theme prefixes stripped before attribution scoring.
    pub prefixes: Vec<String>,
    /// Lower-case phrase inside an item name → entity name.
    pub owner_hints: BTreeMap<String, String>,
}

impl Default for ReferenceCatalog {
    fn default() -> Self {
        Self::default_seed()
    }
}

fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl ReferenceCatalog {
    /// Load from TOML, or JSON when the extension says so.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading reference catalog {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let catalog: Self = if is_json {
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing JSON catalog {}", path.display()))?
        } else {
            toml::from_str(&raw)
                .with_context(|| format!("parsing TOML catalog {}", path.display()))?
        };
        info!(
            target: "catalog",
            path = %path.display(),
            entities = catalog.known_entities.len(),
            overrides = catalog.overrides.len(),
            "reference catalog loaded"
        );
        Ok(catalog)
    }

    /// Like [`load`](Self::load), but a missing file means the built-in seed.
    pub fn load_or_seed(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(target: "catalog", path = %path.display(), "no reference file; using seed");
            return Ok(Self::default_seed());
        }
        Self::load(path)
    }

    /// Catalog spelling of `name`, compared case-insensitively.
    pub fn canonical_entity(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.known_entities
            .iter()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn override_store(&self) -> OverrideStore {
        OverrideStore::from_map(self.overrides.clone())
    }

    pub(crate) fn default_seed() -> Self {
        let known_entities = [
            "Aatrox", "Ahri", "Akali", "Akshan", "Alistar", "Ambessa", "Amumu", "Anivia",
            "Annie", "Aphelios", "Ashe", "Aurelion Sol", "Aurora", "Azir", "Bard", "Bel'Veth",
            "Blitzcrank", "Brand", "Braum", "Briar", "Caitlyn", "Camille", "Cassiopeia",
            "Cho'Gath", "Corki", "Darius", "Diana", "Dr. Mundo", "Draven", "Ekko", "Elise",
            "Evelynn", "Ezreal", "Fiddlesticks", "Fiora", "Fizz", "Galio", "Gangplank", "Garen",
            "Gnar", "Gragas", "Graves", "Gwen", "Hecarim", "Heimerdinger", "Hwei", "Illaoi",
            "Irelia", "Ivern", "Janna", "Jarvan IV", "Jax", "Jayce", "Jhin", "Jinx", "K'Sante",
            "Kai'Sa", "Kalista", "Karma", "Karthus", "Kassadin", "Katarina", "Kayle", "Kayn",
            "Kennen", "Kha'Zix", "Kindred", "Kled", "Kog'Maw", "LeBlanc", "Lee Sin", "Leona",
            "Lillia", "Lissandra", "Lucian", "Lulu", "Lux", "Malphite", "Malzahar", "Maokai",
            "Master Yi", "Milio", "Miss Fortune", "Mordekaiser", "Morgana", "Naafiri", "Nami",
            "Nasus", "Nautilus", "Neeko", "Nidalee", "Nilah", "Nocturne", "Nunu & Willump",
            "Olaf", "Orianna", "Ornn", "Pantheon", "Poppy", "Pyke", "Qiyana", "Quinn", "Rakan",
            "Rammus", "Rek'Sai", "Rell", "Renata Glasc", "Renekton", "Rengar", "Riven", "Rumble",
            "Ryze", "Samira", "Sejuani", "Senna", "Seraphine", "Sett", "Shaco", "Shen",
            "Shyvana", "Singed", "Sion", "Sivir", "Skarner", "Smolder", "Sona", "Soraka", "Swain",
            "Sylas", "Syndra", "Tahm Kench", "Taliyah", "Talon", "Taric", "Teemo", "Thresh",
            "Tristana", "Trundle", "Tryndamere", "Twisted Fate", "Twitch", "Udyr", "Urgot",
            "Varus", "Vayne", "Veigar", "Vel'Koz", "Vex", "Vi", "Viego", "Viktor", "Vladimir",
            "Volibear", "Warwick", "Wukong", "Xayah", "Xerath", "Xin Zhao", "Yasuo", "Yone",
            "Yorick", "Yuumi", "Zac", "Zed", "Zeri", "Ziggs", "Zilean", "Zoe", "Zyra",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let aliases = pairs(&[
            ("cass", "Cassiopeia"),
            ("ali", "Alistar"),
            ("asol", "Aurelion Sol"),
            ("mf", "Miss Fortune"),
            ("tf", "Twisted Fate"),
            ("j4", "Jarvan IV"),
            ("mundo", "Dr. Mundo"),
            ("ww", "Warwick"),
            ("nunu", "Nunu & Willump"),
            ("beez", "Blitzcrank"),
            ("bee", "Vel'Koz"),
            ("kitta", "Nidalee"),
            ("batnivia", "Anivia"),
            ("maw", "Kog'Maw"),
            ("stinger", "Heimerdinger"),
            ("merdinger", "Heimerdinger"),
            ("anna", "Orianna"),
            ("glasc", "Renata Glasc"),
            ("yuubee", "Yuumi"),
            ("bear", "Volibear"),
            ("meowrick", "Yorick"),
            ("birdio", "Galio"),
            ("toy", "Renekton"),
            ("meowkai", "Maokai"),
            ("cracko", "Shaco"),
            ("crabgot", "Urgot"),
            ("mundoverse", "Dr. Mundo"),
            ("fiddle", "Fiddlesticks"),
            ("gp", "Gangplank"),
            ("kass", "Kassadin"),
            ("kat", "Katarina"),
            ("malph", "Malphite"),
            ("morde", "Mordekaiser"),
            ("raka", "Soraka"),
            ("tahm", "Tahm Kench"),
            ("vlad", "Vladimir"),
            ("xin", "Xin Zhao"),
        ]);

        let overrides = pairs(&[
            ("Beezcrank", "Blitzcrank"),
            ("King Beegar", "Veigar"),
            ("Bee'Koz", "Vel'Koz"),
            ("Kittalee", "Nidalee"),
            ("Bewitching Batnivia", "Anivia"),
            ("Zap'Maw", "Kog'Maw"),
            ("Heimerstinger", "Heimerdinger"),
            ("Orbeeanna", "Orianna"),
            ("Admiral Glasc", "Renata Glasc"),
            ("Space Groove Blitz & Crank", "Blitzcrank"),
            ("Bee'Maw", "Kog'Maw"),
            ("Beezahar", "Malzahar"),
            ("Yuubee", "Yuumi"),
            ("The Thousand-Pierced Bear", "Volibear"),
            ("Meowrick", "Yorick"),
            ("Birdio", "Galio"),
            ("Renektoy", "Renekton"),
            ("Meowkai", "Maokai"),
            ("Snowmerdinger", "Heimerdinger"),
            ("Nutcracko", "Shaco"),
            ("Brolaf", "Olaf"),
            ("Lollipoppy", "Poppy"),
            ("Giant Enemy Crabgot", "Urgot"),
            ("Mr. Mundoverse", "Dr. Mundo"),
            ("Gun Goddess Miss Fortune", "Miss Fortune"),
        ]);

        let owner_hints = pairs(&[
            ("urfwick", "Warwick"),
            ("urf", "Warwick"),
            ("alien", "Heimerdinger"),
            ("definitely not", "Blitzcrank"),
            ("festive", "Maokai"),
            ("beemo", "Teemo"),
            ("pug'maw", "Kog'Maw"),
            ("poro", "Braum"),
            ("captain fortune", "Miss Fortune"),
            ("little demon", "Tristana"),
            ("surprise party", "Fiddlesticks"),
            ("emumu", "Amumu"),
        ]);

        Self {
            known_entities,
            aliases,
            overrides,
            prefixes: default_prefixes(),
            owner_hints,
        }
    }
}

/// Items grouped by owner, each group newest first; unknown dates last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CosmeticCatalog {
    pub by_owner: BTreeMap<String, Vec<CosmeticItem>>,
    /// Rows no rule could attribute, in table order.
    pub unattributed: Vec<CosmeticItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub owners: usize,
    pub items: usize,
    pub average_per_owner: f64,
    pub per_year: BTreeMap<i32, usize>,
    pub top_owners: Vec<(String, usize)>,
}

fn is_default_item(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("classic") || lower.contains("original")
}

impl CosmeticCatalog {
    pub fn items_for(&self, owner: &str) -> &[CosmeticItem] {
        self.by_owner.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attributed_count(&self) -> usize {
        self.by_owner.values().map(Vec::len).sum()
    }

    /// Counts over attributed items. Classic/original default items are left
    /// out unless `include_defaults`.
    pub fn stats(&self, top_n: usize, include_defaults: bool) -> CatalogStats {
        let mut per_owner: Vec<(String, usize)> = Vec::new();
        let mut per_year: BTreeMap<i32, usize> = BTreeMap::new();
        let mut items = 0usize;

        for (owner, list) in &self.by_owner {
            let counted: Vec<&CosmeticItem> = list
                .iter()
                .filter(|i| include_defaults || !is_default_item(&i.name))
                .collect();
            if counted.is_empty() {
                continue;
            }
            for item in &counted {
                if let Some(y) = release_year(&item.release_date) {
                    *per_year.entry(y).or_insert(0) += 1;
                }
            }
            items += counted.len();
            per_owner.push((owner.clone(), counted.len()));
        }

        let owners = per_owner.len();
        let average_per_owner = if owners == 0 {
            0.0
        } else {
            items as f64 / owners as f64
        };
        per_owner.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        per_owner.truncate(top_n);

        CatalogStats {
            owners,
            items,
            average_per_owner,
            per_year,
            top_owners: per_owner,
        }
    }
}

fn resolve_owner(
    owner_cell: &str,
    name: &str,
    reference: &ReferenceCatalog,
    by_length: &[&String],
    overrides: &OverrideStore,
) -> Option<String> {
    if let Some(e) = reference.canonical_entity(owner_cell) {
        return Some(e.to_string());
    }
    if let Some(e) = overrides.get(name) {
        return Some(e);
    }
    if let Some(e) = by_length.iter().find(|e| contains_word(name, e)) {
        return Some(e.to_string());
    }
    let lower = name.to_lowercase();
    for (phrase, entity) in &reference.owner_hints {
        if !phrase.is_empty() && lower.contains(phrase.to_lowercase().as_str()) {
            if let Some(e) = reference.canonical_entity(entity) {
                return Some(e.to_string());
            }
        }
    }
    for word in name.split_whitespace() {
        let word = word.to_lowercase();
        if let Some(e) = reference
            .aliases
            .get(&word)
            .and_then(|entity| reference.canonical_entity(entity))
        {
            return Some(e.to_string());
        }
    }
    None
}

/// Assemble the catalog from `[owner, name, release]` rows (header excluded).
/// Rows without an item name are skipped; a repeated name under the same owner
/// is kept once.
pub fn build_cosmetic_catalog(
    rows: &[Vec<String>],
    reference: &ReferenceCatalog,
    overrides: &OverrideStore,
) -> CosmeticCatalog {
    let mut by_length: Vec<&String> = reference.known_entities.iter().collect();
    by_length.sort_by_key(|e| Reverse(e.chars().count()));

    let mut catalog = CosmeticCatalog::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut malformed = 0usize;

    for row in rows {
        let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");
        let (owner_cell, name, release) = (cell(0), cell(1), cell(2));
        if name.is_empty() {
            malformed += 1;
            continue;
        }
        let release_date = if release.is_empty() {
            UNKNOWN_DATE.to_string()
        } else {
            normalize_date(release)
        };

        match resolve_owner(owner_cell, name, reference, &by_length, overrides) {
            Some(owner) => {
                if !seen.insert((owner.clone(), name.to_string())) {
                    continue;
                }
                debug!(target: "catalog", item = name, %owner, "attributed");
                catalog
                    .by_owner
                    .entry(owner.clone())
                    .or_default()
                    .push(CosmeticItem {
                        name: name.to_string(),
                        release_date,
                        owner: Some(owner),
                    });
            }
            None => {
                debug!(target: "catalog", item = name, "unattributed");
                catalog.unattributed.push(CosmeticItem {
                    name: name.to_string(),
                    release_date,
                    owner: None,
                });
            }
        }
    }

    for items in catalog.by_owner.values_mut() {
        items.sort_by_cached_key(|i| Reverse(resolve_date(&i.release_date)));
    }

    if malformed > 0 {
        warn!(target: "catalog", malformed, "skipped rows without an item name");
    }
    info!(
        target: "catalog",
        owners = catalog.by_owner.len(),
        attributed = catalog.attributed_count(),
        unattributed = catalog.unattributed.len(),
        "cosmetic catalog built"
    );
    catalog
}
