use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BLOCK_ID_COLUMN: &str = "geoid20";
pub const BLOCK_ID_LEN: usize = 15;
pub const NO_BLOCK_ASSIGNMENT: &str = "NO BLOCK ASSIGNMENT";

pub const TOTAL_REG: &str = "total_reg";
pub const VOTED_2020: &str = "g20201103_voted_all";
pub const REG_2020: &str = "g20201103_reg_all";
pub const INCOME_SOURCE: &str = "commercialdata_estimatedhhincomeamount_avg";
pub const MEAN_INCOME: &str = "mean_hh_income";

pub const TURNOUT_OUT: &str = "2020_turnout";
pub const REGISTERED_OUT: &str = "2020_registered";
pub const TURNOUT_PCT_OUT: &str = "2020_turnout_pct";
pub const ABSENT_PCT_OUT: &str = "2020_absent_pct";
pub const ABSENT_OUT: &str = "2020_absent";
pub const TURNOUT_PCT_PRED_OUT: &str = "2020_turnout_pct_pred";
pub const ABSENT_PCT_PRED_OUT: &str = "2020_absent_pct_pred";
pub const TURNOUT_PRED_OUT: &str = "2020_turnout_pred";
pub const ABSENT_PRED_OUT: &str = "2020_absent_pred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub column: &'static str,
    pub source: Option<&'static str>,
}

impl Category {
    const fn new(column: &'static str) -> Self {
        Self {
            column,
            source: None,
        }
    }

    const fn renamed(column: &'static str, source: &'static str) -> Self {
        Self {
            column,
            source: Some(source),
        }
    }

    pub fn source_column(&self) -> &'static str {
        self.source.unwrap_or(self.column)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryGroup {
    pub name: &'static str,
    pub categories: &'static [Category],
    pub proportion_range: (f64, f64),
}

const AGE: &[Category] = &[
    Category::new("age_18_19"),
    Category::new("age_20_24"),
    Category::new("age_25_29"),
    Category::new("age_30_34"),
    Category::new("age_35_44"),
    Category::new("age_45_54"),
    Category::new("age_55_64"),
    Category::new("age_65_74"),
    Category::new("age_75_84"),
    Category::new("age_85over"),
];

const GENDER: &[Category] = &[
    Category::renamed("gender_m", "voters_gender_m"),
    Category::renamed("gender_f", "voters_gender_f"),
    Category::renamed("gender_unknown", "voters_gender_unknown"),
];

const PARTY: &[Category] = &[
    Category::new("party_npp"),
    Category::new("party_dem"),
    Category::new("party_rep"),
    Category::new("party_lib"),
    Category::new("party_grn"),
    Category::new("party_con"),
    Category::new("party_ain"),
    Category::new("party_scl"),
    Category::new("party_oth"),
];

const ETHNICITY: &[Category] = &[
    Category::new("eth1_eur"),
    Category::new("eth1_hisp"),
    Category::new("eth1_aa"),
    Category::new("eth1_esa"),
    Category::new("eth1_oth"),
    Category::new("eth1_unk"),
];

const LANGUAGE: &[Category] = &[
    Category::renamed("lang_english", "languages_description_english"),
    Category::renamed("lang_spanish", "languages_description_spanish"),
    Category::renamed("lang_portuguese", "languages_description_portuguese"),
    Category::renamed("lang_chinese", "languages_description_chinese"),
    Category::renamed("lang_italian", "languages_description_italian"),
    Category::renamed("lang_vietnamese", "languages_description_vietnamese"),
    Category::renamed("lang_other", "languages_description_other"),
    Category::renamed("lang_unknown", "languages_description_unknown"),
];

pub const DEMOGRAPHIC_GROUPS: [CategoryGroup; 5] = [
    CategoryGroup {
        name: "age",
        categories: AGE,
        proportion_range: (0.0, 1.0),
    },
    CategoryGroup {
        name: "gender",
        categories: GENDER,
        proportion_range: (0.0, 1.0),
    },
    CategoryGroup {
        name: "party",
        categories: PARTY,
        proportion_range: (0.0, 1.0),
    },
    CategoryGroup {
        name: "ethnicity",
        categories: ETHNICITY,
        proportion_range: (0.0, 1.0),
    },
    CategoryGroup {
        name: "language",
        categories: LANGUAGE,
        proportion_range: (0.0, 1.0),
    },
];

/// Category vectors throughout the crate are indexed by position in this sequence.
pub fn categories() -> impl Iterator<Item = &'static Category> {
    DEMOGRAPHIC_GROUPS
        .iter()
        .flat_map(|group| group.categories.iter())
}

pub fn category_count() -> usize {
    DEMOGRAPHIC_GROUPS
        .iter()
        .map(|group| group.categories.len())
        .sum()
}

pub fn group_spans() -> Vec<(&'static CategoryGroup, std::ops::Range<usize>)> {
    let mut start = 0;
    DEMOGRAPHIC_GROUPS
        .iter()
        .map(|group| {
            let span = start..start + group.categories.len();
            start = span.end;
            (group, span)
        })
        .collect()
}

pub fn predictor_columns() -> Vec<&'static str> {
    let mut columns = vec![TOTAL_REG];
    columns.extend(categories().map(|c| c.column));
    columns.push(MEAN_INCOME);
    columns
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum GeoLevel {
    BlockGroup,
    Tract,
    County,
}

impl GeoLevel {
    pub const ALL: [GeoLevel; 3] = [GeoLevel::BlockGroup, GeoLevel::Tract, GeoLevel::County];

    pub fn prefix_len(&self) -> usize {
        match self {
            Self::BlockGroup => 12,
            Self::Tract => 11,
            Self::County => 5,
        }
    }

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::BlockGroup => "block_group",
            Self::Tract => "tract",
            Self::County => "county",
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::BlockGroup => "block_groups",
            Self::Tract => "tracts",
            Self::County => "counties",
        }
    }

    pub fn parent_id<'a>(&self, geoid: &'a str) -> Option<&'a str> {
        geoid.get(..self.prefix_len())
    }
}

impl Display for GeoLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::BlockGroup => "Block group",
            Self::Tract => "Tract",
            Self::County => "County",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown geography level: {0}")]
pub struct GeoLevelParseError(pub String);

impl FromStr for GeoLevel {
    type Err = GeoLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "block_group" | "block_groups" | "bg" => Ok(Self::BlockGroup),
            "tract" | "tracts" => Ok(Self::Tract),
            "county" | "counties" => Ok(Self::County),
            _ => Err(GeoLevelParseError(s.to_string())),
        }
    }
}
