//! Province and community lookup
//!
//! Region tokens come from federation codes (`PR-AV 12` → Ávila) and are the
//! old provincial plate codes, plus a handful of community-wide tokens used by
//! regional federations. National-park areas are matched by folder name.

use std::collections::HashMap;

pub const UNSPECIFIED_REGION: &str = "Unspecified";

/// Province and autonomous community a token or name resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    /// `None` for community-wide tokens
    pub province: Option<&'static str>,
    pub community: &'static str,
}

impl RegionInfo {
    pub fn unspecified() -> Self {
        Self {
            province: None,
            community: UNSPECIFIED_REGION,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.community == UNSPECIFIED_REGION
    }
}

const ANDALUCIA: &str = "Andalucía";
const ARAGON: &str = "Aragón";
const ASTURIAS: &str = "Principado de Asturias";
const BALEARES: &str = "Illes Balears";
const CANARIAS: &str = "Canarias";
const CANTABRIA: &str = "Cantabria";
const CASTILLA_LEON: &str = "Castilla y León";
const CASTILLA_MANCHA: &str = "Castilla-La Mancha";
const CATALUNA: &str = "Cataluña";
const VALENCIA: &str = "Comunitat Valenciana";
const EXTREMADURA: &str = "Extremadura";
const GALICIA: &str = "Galicia";
const MADRID: &str = "Comunidad de Madrid";
const MURCIA: &str = "Región de Murcia";
const NAVARRA: &str = "Comunidad Foral de Navarra";
const PAIS_VASCO: &str = "País Vasco";
const RIOJA: &str = "La Rioja";

/// (plate token, province, community)
const PROVINCES: &[(&str, &str, &str)] = &[
    ("A", "Alicante", VALENCIA),
    ("AB", "Albacete", CASTILLA_MANCHA),
    ("AL", "Almería", ANDALUCIA),
    ("AV", "Ávila", CASTILLA_LEON),
    ("B", "Barcelona", CATALUNA),
    ("BA", "Badajoz", EXTREMADURA),
    ("BI", "Bizkaia", PAIS_VASCO),
    ("BU", "Burgos", CASTILLA_LEON),
    ("C", "A Coruña", GALICIA),
    ("CA", "Cádiz", ANDALUCIA),
    ("CC", "Cáceres", EXTREMADURA),
    ("CE", "Ceuta", "Ceuta"),
    ("CO", "Córdoba", ANDALUCIA),
    ("CR", "Ciudad Real", CASTILLA_MANCHA),
    ("CS", "Castellón", VALENCIA),
    ("CU", "Cuenca", CASTILLA_MANCHA),
    ("GC", "Las Palmas", CANARIAS),
    ("GI", "Girona", CATALUNA),
    ("GR", "Granada", ANDALUCIA),
    ("GU", "Guadalajara", CASTILLA_MANCHA),
    ("H", "Huelva", ANDALUCIA),
    ("HU", "Huesca", ARAGON),
    ("J", "Jaén", ANDALUCIA),
    ("L", "Lleida", CATALUNA),
    ("LE", "León", CASTILLA_LEON),
    ("LO", "La Rioja", RIOJA),
    ("LU", "Lugo", GALICIA),
    ("M", "Madrid", MADRID),
    ("MA", "Málaga", ANDALUCIA),
    ("ML", "Melilla", "Melilla"),
    ("MU", "Murcia", MURCIA),
    ("NA", "Navarra", NAVARRA),
    ("O", "Asturias", ASTURIAS),
    ("OU", "Ourense", GALICIA),
    ("P", "Palencia", CASTILLA_LEON),
    ("PM", "Illes Balears", BALEARES),
    ("PO", "Pontevedra", GALICIA),
    ("S", "Cantabria", CANTABRIA),
    ("SA", "Salamanca", CASTILLA_LEON),
    ("SE", "Sevilla", ANDALUCIA),
    ("SG", "Segovia", CASTILLA_LEON),
    ("SO", "Soria", CASTILLA_LEON),
    ("SS", "Gipuzkoa", PAIS_VASCO),
    ("T", "Tarragona", CATALUNA),
    ("TE", "Teruel", ARAGON),
    ("TF", "Santa Cruz de Tenerife", CANARIAS),
    ("TO", "Toledo", CASTILLA_MANCHA),
    ("V", "Valencia", VALENCIA),
    ("VA", "Valladolid", CASTILLA_LEON),
    ("VI", "Álava", PAIS_VASCO),
    ("Z", "Zaragoza", ARAGON),
    ("ZA", "Zamora", CASTILLA_LEON),
];

/// Community-wide tokens used by regional federations
const COMMUNITIES: &[(&str, &str)] = &[
    ("AND", ANDALUCIA),
    ("AR", ARAGON),
    ("AS", ASTURIAS),
    ("CAT", CATALUNA),
    ("CV", VALENCIA),
    ("EX", EXTREMADURA),
    ("IB", BALEARES),
];

/// (folded folder-name fragment, province, community)
const NATIONAL_PARKS: &[(&str, &str, &str)] = &[
    ("aiguestortes", "Lleida", CATALUNA),
    ("cabaneros", "Ciudad Real", CASTILLA_MANCHA),
    ("cabrera", "Illes Balears", BALEARES),
    ("caldera de taburiente", "Santa Cruz de Tenerife", CANARIAS),
    ("donana", "Huelva", ANDALUCIA),
    ("garajonay", "Santa Cruz de Tenerife", CANARIAS),
    ("guadarrama", "Madrid", MADRID),
    ("islas atlanticas", "Pontevedra", GALICIA),
    ("monfrague", "Cáceres", EXTREMADURA),
    ("ordesa", "Huesca", ARAGON),
    ("picos de europa", "Asturias", ASTURIAS),
    ("sierra de las nieves", "Málaga", ANDALUCIA),
    ("sierra nevada", "Granada", ANDALUCIA),
    ("tablas de daimiel", "Ciudad Real", CASTILLA_MANCHA),
    ("teide", "Santa Cruz de Tenerife", CANARIAS),
    ("timanfaya", "Las Palmas", CANARIAS),
];

/// Immutable lookup table built once and shared by the extractors
#[derive(Debug, Clone)]
pub struct RegionTable {
    by_token: HashMap<&'static str, RegionInfo>,
    by_name: HashMap<String, RegionInfo>,
    parks: Vec<(&'static str, RegionInfo)>,
}

impl Default for RegionTable {
    fn default() -> Self {
        Self::spain()
    }
}

impl RegionTable {
    pub fn spain() -> Self {
        let mut by_token = HashMap::new();
        let mut by_name = HashMap::new();

        for &(token, province, community) in PROVINCES {
            let info = RegionInfo {
                province: Some(province),
                community,
            };
            by_name.insert(fold(province), info.clone());
            by_token.insert(token, info);
        }
        for &(token, community) in COMMUNITIES {
            by_token.insert(
                token,
                RegionInfo {
                    province: None,
                    community,
                },
            );
        }

        // Common alternate spellings of province names
        for (alias, token) in [
            ("alacant", "A"),
            ("castello", "CS"),
            ("gerona", "GI"),
            ("lerida", "L"),
            ("la coruna", "C"),
            ("orense", "OU"),
            ("vizcaya", "BI"),
            ("guipuzcoa", "SS"),
            ("alava", "VI"),
            ("araba", "VI"),
            ("baleares", "PM"),
        ] {
            if let Some(info) = by_token.get(token) {
                by_name.insert(alias.to_string(), info.clone());
            }
        }

        let parks = NATIONAL_PARKS
            .iter()
            .map(|&(fragment, province, community)| {
                (
                    fragment,
                    RegionInfo {
                        province: Some(province),
                        community,
                    },
                )
            })
            .collect();

        Self {
            by_token,
            by_name,
            parks,
        }
    }

    /// Resolve a plate or community token; unknown → [`RegionInfo::unspecified`]
    pub fn by_token(&self, token: &str) -> RegionInfo {
        self.by_token
            .get(token.trim().to_uppercase().as_str())
            .cloned()
            .unwrap_or_else(RegionInfo::unspecified)
    }

    /// Resolve a free-text province name, tolerant of accents and case
    pub fn by_province_name(&self, name: &str) -> Option<RegionInfo> {
        self.by_name.get(&fold(name)).cloned()
    }

    /// Resolve a national-park folder name such as `Picos_de_Europa`
    pub fn by_park_area(&self, area: &str) -> Option<RegionInfo> {
        let folded = fold(area);
        self.parks
            .iter()
            .find(|(fragment, _)| folded.contains(fragment))
            .map(|(_, info)| info.clone())
    }
}

/// Lower-case, strip Spanish/Catalan diacritics, treat `_`/`-` as spaces
fn fold(text: &str) -> String {
    let folded: String = text
        .trim()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'Á' | 'À' => 'a',
            'é' | 'è' | 'É' | 'È' => 'e',
            'í' | 'ï' | 'Í' | 'Ï' => 'i',
            'ó' | 'ò' | 'Ó' | 'Ò' => 'o',
            'ú' | 'ü' | 'Ú' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            'ç' | 'Ç' => 'c',
            '_' | '-' => ' ',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
