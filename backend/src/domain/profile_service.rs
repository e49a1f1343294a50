use chrono::{Datelike, Utc};
use shared::{ChangeKind, SchoolProfile, UpsertProfileRequest};
use std::sync::Arc;
use tracing::{info, warn};

use super::change_feed::{tables, ChangeFeed};
use super::error::{SchoolError, SchoolResult};
use super::validation::{now_timestamp, optional, required};
use crate::storage::ProfileStorage;

/// The owner's school details
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStorage>,
    feed: ChangeFeed,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStorage>, feed: ChangeFeed) -> Self {
        Self { profiles, feed }
    }

    pub async fn get_profile(&self, owner_id: &str) -> SchoolResult<SchoolProfile> {
        match self.profiles.get_profile(owner_id).await? {
            Some(profile) => Ok(profile),
            None => {
                warn!("No school profile for owner {}", owner_id);
                Err(SchoolError::NotFound("School profile has not been set up".to_string()))
            }
        }
    }

    /// Profile or a placeholder, for documents generated before setup
    pub async fn profile_or_default(&self, owner_id: &str) -> SchoolResult<SchoolProfile> {
        Ok(self.profiles.get_profile(owner_id).await?.unwrap_or_else(|| SchoolProfile {
            owner_id: owner_id.to_string(),
            school_name: "School".to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            logo_path: None,
            session_year: Utc::now().year(),
            updated_at: now_timestamp(),
        }))
    }

    pub async fn upsert_profile(&self, owner_id: &str, request: UpsertProfileRequest) -> SchoolResult<SchoolProfile> {
        info!("Saving school profile for owner {}", owner_id);

        let school_name = required("School name", &request.school_name)?;
        if !(1900..=2200).contains(&request.session_year) {
            return Err(SchoolError::validation("Session year is out of range"));
        }

        let profile = SchoolProfile {
            owner_id: owner_id.to_string(),
            school_name,
            address: request.address.trim().to_string(),
            phone: request.phone.trim().to_string(),
            email: request.email.trim().to_string(),
            logo_path: optional(request.logo_path),
            session_year: request.session_year,
            updated_at: now_timestamp(),
        };

        self.profiles.upsert_profile(&profile).await?;
        self.feed.publish(owner_id, tables::PROFILES, ChangeKind::Update, owner_id);
        Ok(profile)
    }
}
