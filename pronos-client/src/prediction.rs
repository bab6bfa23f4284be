use crate::{
    api::{self, Confidence, MatchLeg, NewPost, PostId, PostStore, Prediction, Sport, Uuid},
    odds::{parse_odds, CombinedOdds},
};

/// Identifies a leg within one form
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LegId(u64);

/// A match leg as currently typed in the form
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LegDraft {
    pub id: LegId,
    pub teams: String,
    pub competition: String,
    pub kickoff_time: String,
    pub prediction_text: String,
    pub odds: String,
}

impl LegDraft {
    fn empty(id: LegId) -> LegDraft {
        LegDraft {
            id,
            teams: String::new(),
            competition: String::new(),
            kickoff_time: String::new(),
            prediction_text: String::new(),
            odds: String::new(),
        }
    }

    pub fn odds(&self) -> Option<f64> {
        parse_odds(&self.odds)
    }

    pub fn is_complete(&self) -> bool {
        !self.teams.trim().is_empty()
            && !self.prediction_text.trim().is_empty()
            && self.odds().is_some()
    }

    fn field_mut(&mut self, field: LegField) -> &mut String {
        match field {
            LegField::Teams => &mut self.teams,
            LegField::Competition => &mut self.competition,
            LegField::KickoffTime => &mut self.kickoff_time,
            LegField::Prediction => &mut self.prediction_text,
            LegField::Odds => &mut self.odds,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LegField {
    Teams,
    Competition,
    KickoffTime,
    Prediction,
    Odds,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    Single,
    Combined,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("the analysis is required")]
    MissingAnalysis,

    #[error("odds of leg {0:?} are not a valid number")]
    InvalidOdds(LegId),

    #[error("leg {0:?} is missing its teams or its prediction")]
    IncompleteLeg(LegId),

    #[error("the prediction is already being submitted")]
    AlreadySubmitting,

    #[error("the prediction was refused: {0}")]
    Rejected(#[from] api::Error),
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| String::from(s))
}

/// State of the "new prediction" form
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PredictionForm {
    pub sport: Option<Sport>,
    pub analysis: String,
    pub confidence: Confidence,
    pub image_url: Option<String>,
    pub video_url: Option<String>,

    // never empty
    legs: Vec<LegDraft>,
    next_leg_id: u64,
    submitting: bool,
}

impl Default for PredictionForm {
    fn default() -> PredictionForm {
        PredictionForm::new()
    }
}

impl PredictionForm {
    pub fn new() -> PredictionForm {
        PredictionForm {
            sport: None,
            analysis: String::new(),
            confidence: Confidence::default(),
            image_url: None,
            video_url: None,
            legs: vec![LegDraft::empty(LegId(0))],
            next_leg_id: 1,
            submitting: false,
        }
    }

    pub fn legs(&self) -> &[LegDraft] {
        &self.legs
    }

    pub fn mode(&self) -> Mode {
        match self.legs.len() {
            1 => Mode::Single,
            _ => Mode::Combined,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn add_leg(&mut self) -> LegId {
        let id = LegId(self.next_leg_id);
        self.next_leg_id += 1;
        self.legs.push(LegDraft::empty(id));
        id
    }

    /// Returns false if the leg does not exist or is the last one
    pub fn remove_leg(&mut self, id: LegId) -> bool {
        if self.legs.len() <= 1 {
            return false;
        }
        match self.legs.iter().position(|l| l.id == id) {
            Some(pos) => {
                self.legs.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns false if the leg does not exist
    pub fn update_leg(&mut self, id: LegId, field: LegField, value: &str) -> bool {
        match self.legs.iter_mut().find(|l| l.id == id) {
            Some(leg) => {
                *leg.field_mut(field) = String::from(value);
                true
            }
            None => false,
        }
    }

    pub fn combined_odds(&self) -> CombinedOdds {
        CombinedOdds::of(self.legs.iter().map(|l| l.odds()))
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.analysis.trim().is_empty() {
            return Err(FormError::MissingAnalysis);
        }
        match self.mode() {
            Mode::Single => {
                let leg = &self.legs[0];
                if leg.odds().is_none() {
                    return Err(FormError::InvalidOdds(leg.id));
                }
            }
            Mode::Combined => {
                for leg in &self.legs {
                    if leg.teams.trim().is_empty() || leg.prediction_text.trim().is_empty() {
                        return Err(FormError::IncompleteLeg(leg.id));
                    }
                    if leg.odds().is_none() {
                        return Err(FormError::InvalidOdds(leg.id));
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the submit button should be enabled
    pub fn is_submittable(&self) -> bool {
        !self.submitting && self.validate().is_ok()
    }

    pub fn to_new_post(&self) -> Result<NewPost, FormError> {
        self.validate()?;
        let prediction = match self.mode() {
            Mode::Single => {
                let leg = &self.legs[0];
                Prediction::Single {
                    sport: self.sport,
                    match_teams: non_empty(&leg.teams),
                    prediction_text: non_empty(&leg.prediction_text),
                    odds: leg.odds().ok_or(FormError::InvalidOdds(leg.id))?,
                }
            }
            Mode::Combined => Prediction::Combined {
                legs: self
                    .legs
                    .iter()
                    .map(|l| -> Result<MatchLeg, FormError> {
                        Ok(MatchLeg {
                            teams: String::from(l.teams.trim()),
                            competition: String::from(l.competition.trim()),
                            kickoff_time: String::from(l.kickoff_time.trim()),
                            prediction_text: String::from(l.prediction_text.trim()),
                            odds: l.odds().ok_or(FormError::InvalidOdds(l.id))?,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                total_odds: self.combined_odds().rounded(),
            },
        };
        Ok(NewPost {
            id: PostId(Uuid::new_v4()),
            analysis: String::from(self.analysis.trim()),
            confidence: self.confidence,
            image_url: self.image_url.clone(),
            video_url: self.video_url.clone(),
            prediction,
        })
    }

    /// Locks the form and returns the post to send
    pub fn begin_submit(&mut self) -> Result<NewPost, FormError> {
        if self.submitting {
            return Err(FormError::AlreadySubmitting);
        }
        let post = self.to_new_post()?;
        self.submitting = true;
        Ok(post)
    }

    /// Unlocks the form, clearing it if the post was created
    pub fn finish_submit(&mut self, res: Result<PostId, api::Error>) -> Result<PostId, FormError> {
        self.submitting = false;
        match res {
            Ok(id) => {
                *self = PredictionForm::new();
                Ok(id)
            }
            Err(err) => {
                tracing::error!(?err, "failed creating post");
                Err(FormError::Rejected(err))
            }
        }
    }

    pub async fn submit<S>(&mut self, store: &S) -> Result<PostId, FormError>
    where
        S: PostStore + ?Sized,
    {
        let post = self.begin_submit()?;
        let res = store.create_post(post).await;
        self.finish_submit(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(form: &mut PredictionForm, id: LegId, teams: &str, pick: &str, odds: &str) {
        assert!(form.update_leg(id, LegField::Teams, teams));
        assert!(form.update_leg(id, LegField::Prediction, pick));
        assert!(form.update_leg(id, LegField::Odds, odds));
    }

    #[test]
    fn starts_single_with_one_leg() {
        let form = PredictionForm::new();
        assert_eq!(form.legs().len(), 1);
        assert_eq!(form.mode(), Mode::Single);
        assert_eq!(form.confidence.stars(), 3);
        assert!(form.combined_odds().is_zero());
        assert!(!form.is_submittable());
    }

    #[test]
    fn mode_follows_leg_count() {
        let mut form = PredictionForm::new();
        let first = form.legs()[0].id;
        let second = form.add_leg();
        assert_eq!(form.mode(), Mode::Combined);
        let third = form.add_leg();
        assert_eq!(form.mode(), Mode::Combined);
        assert!(form.remove_leg(third));
        assert_eq!(form.mode(), Mode::Combined);
        assert!(form.remove_leg(first));
        assert_eq!(form.mode(), Mode::Single);
        assert_eq!(form.legs()[0].id, second);
    }

    #[test]
    fn last_leg_cannot_be_removed() {
        let mut form = PredictionForm::new();
        let only = form.legs()[0].id;
        assert!(!form.remove_leg(only));
        assert_eq!(form.legs().len(), 1);
    }

    #[test]
    fn leg_ids_are_never_reused() {
        let mut form = PredictionForm::new();
        let a = form.add_leg();
        assert!(form.remove_leg(a));
        let b = form.add_leg();
        assert_ne!(a, b);
        assert!(!form.remove_leg(a));
        assert!(!form.update_leg(a, LegField::Odds, "2.0"));
    }

    #[test]
    fn combined_odds_follow_edits() {
        let mut form = PredictionForm::new();
        let first = form.legs()[0].id;
        form.update_leg(first, LegField::Odds, "1.45");
        let second = form.add_leg();
        assert_eq!(form.combined_odds().to_string(), "1.45");
        form.update_leg(second, LegField::Odds, "1.65");
        let third = form.add_leg();
        form.update_leg(third, LegField::Odds, "1.35");
        assert_eq!(form.combined_odds().to_string(), "3.23");
        form.update_leg(second, LegField::Odds, "oops");
        assert_eq!(form.combined_odds().to_string(), "1.96");
        form.remove_leg(third);
        assert_eq!(form.combined_odds().to_string(), "1.45");
    }

    #[test]
    fn incomplete_leg_blocks_submission() {
        let mut form = PredictionForm::new();
        form.analysis = String::from("Both sides score a lot at home");
        let first = form.legs()[0].id;
        fill(&mut form, first, "A vs B", "A wins", "1.5");
        assert!(form.is_submittable());

        let second = form.add_leg();
        assert_eq!(form.validate(), Err(FormError::IncompleteLeg(second)));
        assert!(!form.is_submittable());

        fill(&mut form, second, "C vs D", "draw", "");
        assert_eq!(form.validate(), Err(FormError::InvalidOdds(second)));
        form.update_leg(second, LegField::Odds, "3.2");
        assert!(form.is_submittable());

        form.analysis = String::from("   ");
        assert_eq!(form.validate(), Err(FormError::MissingAnalysis));
    }

    #[test]
    fn single_mode_only_needs_odds_and_analysis() {
        let mut form = PredictionForm::new();
        form.analysis = String::from("Home advantage");
        let first = form.legs()[0].id;
        form.update_leg(first, LegField::Odds, "2,10");
        assert!(form.is_submittable());
        match form.to_new_post().map(|p| p.prediction) {
            Ok(Prediction::Single {
                match_teams, odds, ..
            }) => {
                assert_eq!(match_teams, None);
                assert_eq!(odds, 2.1);
            }
            r => panic!("unexpected submission {r:?}"),
        }
    }

    #[test]
    fn combined_submission_carries_total_odds() {
        let mut form = PredictionForm::new();
        form.analysis = String::from("Favorites at home");
        form.confidence = Confidence::new(4).unwrap();
        let first = form.legs()[0].id;
        fill(&mut form, first, "PSG vs OM", "PSG", "1.45");
        let second = form.add_leg();
        fill(&mut form, second, "OL vs LOSC", "OL", "1.65");
        let third = form.add_leg();
        fill(&mut form, third, "RCL vs SRFC", "RCL", "1.35");

        let post = form.to_new_post().unwrap();
        assert_eq!(post.validate(), Ok(()));
        assert_eq!(post.confidence.stars(), 4);
        match post.prediction {
            Prediction::Combined { legs, total_odds } => {
                assert_eq!(legs.len(), 3);
                assert_eq!(total_odds, 3.23);
            }
            p => panic!("unexpected prediction {p:?}"),
        }
    }

    #[test]
    fn submission_locks_and_resets() {
        let mut form = PredictionForm::new();
        form.analysis = String::from("Home advantage");
        let first = form.legs()[0].id;
        form.update_leg(first, LegField::Odds, "2.5");

        let post = form.begin_submit().unwrap();
        assert!(form.is_submitting());
        assert!(!form.is_submittable());
        assert_eq!(form.begin_submit(), Err(FormError::AlreadySubmitting));

        let err = api::Error::Unknown(String::from("backend down"));
        assert_eq!(
            form.finish_submit(Err(err.clone())),
            Err(FormError::Rejected(err))
        );
        assert!(!form.is_submitting());
        assert_eq!(form.analysis, "Home advantage");

        form.begin_submit().unwrap();
        assert_eq!(form.finish_submit(Ok(post.id)), Ok(post.id));
        assert_eq!(form, PredictionForm::new());
    }
}
