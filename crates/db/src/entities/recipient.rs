//! Recipient entity.
//!
//! Contact mirror for notification targets. The marketplace's user and admin
//! tables are the source of truth; this table carries just enough to resolve
//! a recipient to contact details without reaching into those schemas.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::notification::ActorKind;

/// A resolvable notification recipient.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipient")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Kind of actor this contact row belongs to.
    pub recipient_type: ActorKind,

    /// Name used in rendered greetings.
    pub display_name: String,

    /// Email address, if on file.
    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// Phone number in E.164 form, if on file.
    #[sea_orm(nullable)]
    pub phone: Option<String>,

    /// Inactive recipients are skipped during fan-out.
    #[sea_orm(default_value = true)]
    pub is_active: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
