//! Small per-device preferences kept in durable storage: the first-visit
//! flag, dismissed announcements and the per-user trailer ratings. Reads
//! fall back to defaults; writes are best-effort.

use crate::{
    features::videos::types::RATING_RANGE,
    shared::{
        errors::{swallowed, AppError},
        storage::Storage,
    },
};
use std::{collections::BTreeMap, sync::Arc};

pub const HAS_VISITED_KEY: &str = "doja_auth_has_visited";

const ANNOUNCEMENTS_PREFIX: &str = "announcements_dismissed_v2_";
const RATINGS_PREFIX: &str = "doja_trailer_ratings_";
const ANONYMOUS: &str = "anon";
const FLAG_SET: &str = "1";

/// Which auth form to show first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    SignUp,
    SignIn,
}

pub type Ratings = BTreeMap<String, u8>;

#[derive(Clone)]
pub struct Preferences {
    storage: Arc<dyn Storage>,
}

fn user_key(prefix: &str, user_id: Option<&str>) -> String {
    let user = user_id.filter(|id| !id.is_empty()).unwrap_or(ANONYMOUS);
    format!("{prefix}{user}")
}

impl Preferences {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn has_visited(&self) -> bool {
        self.storage.get(HAS_VISITED_KEY).as_deref() == Some(FLAG_SET)
    }

    pub fn mark_visited(&self) {
        self.set_flag(HAS_VISITED_KEY);
    }

    /// First visits land on sign-up, returning visitors on sign-in.
    pub fn initial_auth_mode(&self) -> AuthMode {
        if self.has_visited() {
            AuthMode::SignIn
        } else {
            AuthMode::SignUp
        }
    }

    pub fn announcements_dismissed(&self, user_id: Option<&str>) -> bool {
        self.storage
            .get(&user_key(ANNOUNCEMENTS_PREFIX, user_id))
            .as_deref()
            == Some(FLAG_SET)
    }

    pub fn dismiss_announcements(&self, user_id: Option<&str>) {
        self.set_flag(&user_key(ANNOUNCEMENTS_PREFIX, user_id));
    }

    /// Ratings by video id. A corrupt value reads as no ratings, and entries
    /// outside one to five stars are ignored.
    pub fn ratings(&self, user_id: Option<&str>) -> Ratings {
        let Some(raw) = self.storage.get(&user_key(RATINGS_PREFIX, user_id)) else {
            return Ratings::new();
        };
        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(map) => map
                .into_iter()
                .filter_map(|(video_id, rating)| {
                    let rating = u8::try_from(rating.as_u64()?).ok()?;
                    RATING_RANGE.contains(&rating).then_some((video_id, rating))
                })
                .collect(),
            Err(err) => {
                swallowed("read trailer ratings", &err);
                Ratings::new()
            }
        }
    }

    pub fn rating(&self, user_id: Option<&str>, video_id: &str) -> Option<u8> {
        self.ratings(user_id).get(video_id).copied()
    }

    /// # Errors
    /// Returns a validation error for a rating outside one to five stars.
    pub fn set_rating(
        &self,
        user_id: Option<&str>,
        video_id: &str,
        rating: u8,
    ) -> Result<(), AppError> {
        if !RATING_RANGE.contains(&rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
        let mut ratings = self.ratings(user_id);
        ratings.insert(video_id.to_string(), rating);

        match serde_json::to_string(&ratings) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(&user_key(RATINGS_PREFIX, user_id), &raw) {
                    swallowed("save trailer ratings", &err);
                }
            }
            Err(err) => swallowed("encode trailer ratings", &err),
        }
        Ok(())
    }

    fn set_flag(&self, key: &str) {
        if let Err(err) = self.storage.set(key, FLAG_SET) {
            swallowed("save preference flag", &err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::storage::MemoryStorage;

    fn prefs() -> (Preferences, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (Preferences::new(storage.clone()), storage)
    }

    #[test]
    fn first_visit_selects_sign_up() {
        let (prefs, storage) = prefs();
        assert_eq!(prefs.initial_auth_mode(), AuthMode::SignUp);
        prefs.mark_visited();
        assert_eq!(storage.get(HAS_VISITED_KEY).as_deref(), Some("1"));
        assert_eq!(prefs.initial_auth_mode(), AuthMode::SignIn);
    }

    #[test]
    fn announcements_are_per_user() {
        let (prefs, storage) = prefs();
        prefs.dismiss_announcements(Some("u1"));
        assert!(prefs.announcements_dismissed(Some("u1")));
        assert!(!prefs.announcements_dismissed(Some("u2")));
        assert!(!prefs.announcements_dismissed(None));

        prefs.dismiss_announcements(None);
        assert_eq!(
            storage.get("announcements_dismissed_v2_anon").as_deref(),
            Some("1")
        );
    }

    #[test]
    fn ratings_round_through_storage() {
        let (prefs, storage) = prefs();
        prefs.set_rating(Some("u1"), "42", 4).unwrap();
        prefs.set_rating(Some("u1"), "7", 5).unwrap();
        assert_eq!(prefs.rating(Some("u1"), "42"), Some(4));
        assert_eq!(prefs.rating(None, "42"), None);
        assert_eq!(
            storage.get("doja_trailer_ratings_u1").as_deref(),
            Some(r#"{"42":4,"7":5}"#)
        );

        let err = prefs.set_rating(Some("u1"), "42", 0).unwrap_err();
        assert_eq!(err.message(), "Rating must be between 1 and 5");
    }

    #[test]
    fn corrupt_ratings_read_as_empty() {
        let (prefs, storage) = prefs();
        storage.set("doja_trailer_ratings_u1", "{not json").unwrap();
        assert!(prefs.ratings(Some("u1")).is_empty());

        storage
            .set("doja_trailer_ratings_u1", r#"{"1":3,"2":9,"3":"x"}"#)
            .unwrap();
        let ratings = prefs.ratings(Some("u1"));
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings.get("1"), Some(&3));
    }
}
