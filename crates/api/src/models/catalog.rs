//! Catalog types: leagues, teams, jersey types, jerseys and their images.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use fanatik_core::{JerseyId, JerseyImageId, JerseyTypeId, LeagueId, Money, TeamId};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueInput {
    pub name: String,
    pub image_base64: Option<String>,
}

/// A team with the name of the league it plays in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub image_base64: Option<String>,
    pub league_id: LeagueId,
    pub league_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamInput {
    pub name: String,
    pub league_id: LeagueId,
    pub image_base64: Option<String>,
}

/// A price tier, e.g. fan or player version.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JerseyType {
    pub id: JerseyTypeId,
    pub name: String,
    pub original_price: Money,
    pub current_price: Money,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JerseyTypeInput {
    pub name: String,
    pub original_price: Money,
    pub current_price: Money,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JerseyImage {
    pub id: JerseyImageId,
    pub jersey_id: JerseyId,
    pub image_base64: String,
    pub is_main: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JerseyImageInput {
    pub image_base64: String,
    #[serde(default)]
    pub is_main: bool,
}

/// The team summary embedded in every jersey.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
    pub league_id: LeagueId,
}

/// A jersey with its team, price tier and images.
#[derive(Debug, Clone, Serialize)]
pub struct Jersey {
    pub id: JerseyId,
    pub team_id: TeamId,
    pub jersey_type_id: JerseyTypeId,
    pub season: String,
    pub main_color: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub team_name: String,
    pub team: TeamRef,
    pub jersey_type: JerseyType,
    pub images: Vec<JerseyImage>,
}

/// Jersey fields for create and full update.
///
/// On update an empty `images` list keeps the current images.
#[derive(Debug, Clone, Deserialize)]
pub struct JerseyInput {
    pub team_id: TeamId,
    pub jersey_type_id: JerseyTypeId,
    pub season: String,
    pub main_color: String,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<JerseyImageInput>,
}

/// One row of the jersey/team/type join, before images are attached.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct JerseyRow {
    pub id: JerseyId,
    pub team_id: TeamId,
    pub jersey_type_id: JerseyTypeId,
    pub season: String,
    pub main_color: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub team_name: String,
    pub league_id: LeagueId,
    pub type_name: String,
    pub original_price: Money,
    pub current_price: Money,
    pub type_description: Option<String>,
}

impl JerseyRow {
    pub(crate) fn into_jersey(self, images: Vec<JerseyImage>) -> Jersey {
        Jersey {
            id: self.id,
            team_id: self.team_id,
            jersey_type_id: self.jersey_type_id,
            season: self.season,
            main_color: self.main_color,
            description: self.description,
            created_at: self.created_at,
            team: TeamRef {
                id: self.team_id,
                name: self.team_name.clone(),
                league_id: self.league_id,
            },
            team_name: self.team_name,
            jersey_type: JerseyType {
                id: self.jersey_type_id,
                name: self.type_name,
                original_price: self.original_price,
                current_price: self.current_price,
                description: self.type_description,
            },
            images,
        }
    }
}
