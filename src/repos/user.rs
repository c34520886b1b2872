use sea_orm::{ConnectionTrait, DbErr, EntityTrait};
use uuid::Uuid;

use crate::entity::users::{self, Entity as Users};

#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepo;

impl UserRepo {
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<users::Model>, DbErr> {
        Users::find_by_id(user_id).one(conn).await
    }
}
