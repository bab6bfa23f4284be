use std::fmt;

use uuid::Uuid;

use crate::{Author, Error, Time, STUB_UUID};

// Combined odds are shown with two decimals, so a submitted total may be off
// from the exact product by half a cent, plus float error growing with the
// product
const TOTAL_ODDS_HALF_CENT: f64 = 0.005;
const TOTAL_ODDS_RELATIVE_ERROR: f64 = 1e-12;

fn total_matches(product: f64, total: f64) -> bool {
    let slack = TOTAL_ODDS_HALF_CENT + product.abs().max(1.0) * TOTAL_ODDS_RELATIVE_ERROR;
    (product - total).abs() <= slack
}

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn stub() -> PostId {
        PostId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Football,
    Basketball,
    Tennis,
    Rugby,
    Hockey,
    Baseball,
    Other,
}

impl Sport {
    pub fn all() -> &'static [Sport] {
        &[
            Sport::Football,
            Sport::Basketball,
            Sport::Tennis,
            Sport::Rugby,
            Sport::Hockey,
            Sport::Baseball,
            Sport::Other,
        ]
    }
}

/// Self-rating of a prediction, from 1 to 5 stars
#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Result<Confidence, Error> {
        if !(Confidence::MIN..=Confidence::MAX).contains(&stars) {
            return Err(Error::InvalidConfidence(stars));
        }
        Ok(Confidence(stars))
    }

    pub fn stars(&self) -> u8 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Confidence {
        Confidence(3)
    }
}

impl TryFrom<u8> for Confidence {
    type Error = Error;

    fn try_from(stars: u8) -> Result<Confidence, Error> {
        Confidence::new(stars)
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> u8 {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Confidence::MAX)
    }
}

/// One match of a prediction
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MatchLeg {
    pub teams: String,
    pub competition: String,
    pub kickoff_time: String,
    pub prediction_text: String,
    pub odds: f64,
}

impl MatchLeg {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.teams)?;
        crate::validate_content(&self.prediction_text)?;
        crate::validate_string(&self.competition)?;
        crate::validate_string(&self.kickoff_time)?;
        crate::validate_odds(self.odds)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum Prediction {
    Single {
        sport: Option<Sport>,
        match_teams: Option<String>,
        prediction_text: Option<String>,
        odds: f64,
    },
    Combined {
        legs: Vec<MatchLeg>,
        total_odds: f64,
    },
}

impl Prediction {
    /// Odds a bettor would get on this prediction
    pub fn odds(&self) -> f64 {
        match self {
            Prediction::Single { odds, .. } => *odds,
            Prediction::Combined { total_odds, .. } => *total_odds,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Prediction::Single {
                sport: _,
                match_teams,
                prediction_text,
                odds,
            } => {
                for s in match_teams.iter().chain(prediction_text.iter()) {
                    crate::validate_string(s)?;
                }
                crate::validate_odds(*odds)
            }
            Prediction::Combined { legs, total_odds } => {
                if legs.len() < 2 {
                    return Err(Error::InvalidOdds(format!(
                        "a combined prediction needs at least two legs, got {}",
                        legs.len()
                    )));
                }
                for l in legs {
                    l.validate()?;
                }
                crate::validate_odds(*total_odds)?;
                let product = legs.iter().map(|l| l.odds).product::<f64>();
                if !total_matches(product, *total_odds) {
                    return Err(Error::InvalidOdds(format!(
                        "total odds {total_odds} do not match the legs' product {product:.2}"
                    )));
                }
                Ok(())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewPost {
    pub id: PostId,
    pub analysis: String,
    pub confidence: Confidence,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub prediction: Prediction,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_content(&self.analysis)?;
        for url in self.image_url.iter().chain(self.video_url.iter()) {
            crate::validate_string(url)?;
        }
        self.prediction.validate()
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Post {
    pub id: PostId,
    pub author: Author,
    pub created_at: Time,

    pub analysis: String,
    pub confidence: Confidence,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub prediction: Prediction,

    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    pub liked_by_current_user: bool,
}
