use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entity::products::{self, Column as ProdCol, Entity as Products};
use crate::routes::params::ProductQuery;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRepo;

impl ProductRepo {
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<Option<products::Model>, DbErr> {
        Products::find_by_id(product_id).one(conn).await
    }

    pub async fn exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
    ) -> Result<bool, DbErr> {
        let count = Products::find()
            .filter(ProdCol::Id.eq(product_id))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn list<C: ConnectionTrait>(
        &self,
        conn: &C,
        query: &ProductQuery,
    ) -> Result<(Vec<products::Model>, i64), DbErr> {
        let (_, limit, offset) = query.pagination.normalize();

        let mut condition = Condition::all();
        if let Some(q) = query.q.as_ref().filter(|q| !q.is_empty()) {
            condition = condition.add(ProdCol::Name.contains(q.clone()));
        }
        if let Some(min) = query.min_price {
            condition = condition.add(ProdCol::Price.gte(min));
        }
        if let Some(max) = query.max_price {
            condition = condition.add(ProdCol::Price.lte(max));
        }

        let finder = Products::find()
            .filter(condition)
            .order_by_desc(ProdCol::CreatedAt);

        let total = finder.clone().count(conn).await? as i64;
        let products = finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(conn)
            .await?;

        Ok((products, total))
    }
}
