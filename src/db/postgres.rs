// Postgres entity store. Queries are runtime-checked so the crate builds
// without a live database; the schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{
    Bloc, Container, CustomField, Location, Member, Note, Position, Role, Tag, Warehouse,
};

use super::{BlocStore, NoteStore, TagStore, WarehouseStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---
// Row types. The wire models keep nested shapes (location, position, member
// list); rows flatten them into columns and JSONB.
// ---

#[derive(FromRow)]
struct WarehouseRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    depth: Option<f64>,
    max_weight: Option<f64>,
    owner_id: Uuid,
    members: Json<Vec<Member>>,
    plan_image: Option<String>,
    invite_token: Option<String>,
    invite_role: Option<Role>,
    invite_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            id: row.id,
            name: row.name,
            description: row.description,
            location: Location {
                address: row.address,
                city: row.city,
                country: row.country,
            },
            width: row.width,
            height: row.height,
            depth: row.depth,
            max_weight: row.max_weight,
            owner: row.owner_id,
            members: row.members.0,
            plan_image: row.plan_image,
            invite_token: row.invite_token,
            invite_role: row.invite_role,
            invite_expires: row.invite_expires,
            created_at: row.created_at,
            last_update: row.last_update,
        }
    }
}

#[derive(FromRow)]
struct BlocRow {
    id: Uuid,
    name: String,
    picture: Option<String>,
    parent_id: Option<Uuid>,
    width: Option<f64>,
    height: Option<f64>,
    depth: Option<f64>,
    weight: Option<f64>,
    max_weight: Option<f64>,
    pos_x: f64,
    pos_y: f64,
    tags: Vec<Uuid>,
    custom_fields: Json<Vec<CustomField>>,
    warehouse_id: Uuid,
    added_by: Uuid,
    created_at: DateTime<Utc>,
    last_update: DateTime<Utc>,
}

impl From<BlocRow> for Bloc {
    fn from(row: BlocRow) -> Self {
        Bloc {
            id: row.id,
            name: row.name,
            picture: row.picture,
            container: Container::from_parent(row.parent_id),
            width: row.width,
            height: row.height,
            depth: row.depth,
            weight: row.weight,
            max_weight: row.max_weight,
            position: Position {
                x: row.pos_x,
                y: row.pos_y,
            },
            tags: row.tags,
            custom_fields: row.custom_fields.0,
            warehouse: row.warehouse_id,
            added_by: row.added_by,
            created_at: row.created_at,
            last_update: row.last_update,
        }
    }
}

#[derive(FromRow)]
struct TagRow {
    id: Uuid,
    name: String,
    color: String,
    warehouse_id: Uuid,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            color: row.color,
            warehouse: row.warehouse_id,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct NoteRow {
    id: Uuid,
    content: String,
    bloc_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            content: row.content,
            bloc: row.bloc_id,
            user: row.user_id,
            created_at: row.created_at,
        }
    }
}

const WAREHOUSE_COLS: &str = "id, name, description, address, city, country, width, height, depth, \
     max_weight, owner_id, members, plan_image, invite_token, invite_role, invite_expires, \
     created_at, last_update";

const BLOC_COLS: &str = "id, name, picture, parent_id, width, height, depth, weight, max_weight, \
     pos_x, pos_y, tags, custom_fields, warehouse_id, added_by, created_at, last_update";

#[async_trait]
impl WarehouseStore for PgStore {
    async fn insert(&self, w: &Warehouse) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO warehouses (id, name, description, address, city, country, width, height, \
             depth, max_weight, owner_id, members, plan_image, invite_token, invite_role, \
             invite_expires, created_at, last_update) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(w.id)
        .bind(&w.name)
        .bind(&w.description)
        .bind(&w.location.address)
        .bind(&w.location.city)
        .bind(&w.location.country)
        .bind(w.width)
        .bind(w.height)
        .bind(w.depth)
        .bind(w.max_weight)
        .bind(w.owner)
        .bind(Json(&w.members))
        .bind(&w.plan_image)
        .bind(&w.invite_token)
        .bind(w.invite_role)
        .bind(w.invite_expires)
        .bind(w.created_at)
        .bind(w.last_update)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Warehouse>, AppError> {
        let row = sqlx::query_as::<_, WarehouseRow>(&format!(
            "SELECT {WAREHOUSE_COLS} FROM warehouses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Warehouse::from))
    }

    async fn find_for_user(&self, user: Uuid) -> Result<Vec<Warehouse>, AppError> {
        let rows = sqlx::query_as::<_, WarehouseRow>(&format!(
            "SELECT {WAREHOUSE_COLS} FROM warehouses \
             WHERE owner_id = $1 OR members @> $2 ORDER BY created_at ASC"
        ))
        .bind(user)
        .bind(Json(json!([{ "user": user }])))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Warehouse::from).collect())
    }

    async fn find_by_invite(&self, token: &str) -> Result<Option<Warehouse>, AppError> {
        let row = sqlx::query_as::<_, WarehouseRow>(&format!(
            "SELECT {WAREHOUSE_COLS} FROM warehouses WHERE invite_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Warehouse::from))
    }

    async fn update(&self, w: &Warehouse) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE warehouses SET name = $2, description = $3, address = $4, city = $5, \
             country = $6, width = $7, height = $8, depth = $9, max_weight = $10, members = $11, \
             plan_image = $12, invite_token = $13, invite_role = $14, invite_expires = $15, \
             last_update = $16 WHERE id = $1",
        )
        .bind(w.id)
        .bind(&w.name)
        .bind(&w.description)
        .bind(&w.location.address)
        .bind(&w.location.city)
        .bind(&w.location.country)
        .bind(w.width)
        .bind(w.height)
        .bind(w.depth)
        .bind(w.max_weight)
        .bind(Json(&w.members))
        .bind(&w.plan_image)
        .bind(&w.invite_token)
        .bind(w.invite_role)
        .bind(w.invite_expires)
        .bind(w.last_update)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BlocStore for PgStore {
    async fn insert(&self, b: &Bloc) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO blocs (id, name, picture, parent_id, width, height, depth, weight, \
             max_weight, pos_x, pos_y, tags, custom_fields, warehouse_id, added_by, created_at, \
             last_update) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(b.id)
        .bind(&b.name)
        .bind(&b.picture)
        .bind(b.parent())
        .bind(b.width)
        .bind(b.height)
        .bind(b.depth)
        .bind(b.weight)
        .bind(b.max_weight)
        .bind(b.position.x)
        .bind(b.position.y)
        .bind(&b.tags)
        .bind(Json(&b.custom_fields))
        .bind(b.warehouse)
        .bind(b.added_by)
        .bind(b.created_at)
        .bind(b.last_update)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Bloc>, AppError> {
        let row = sqlx::query_as::<_, BlocRow>(&format!(
            "SELECT {BLOC_COLS} FROM blocs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Bloc::from))
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Bloc>, AppError> {
        let rows = sqlx::query_as::<_, BlocRow>(&format!(
            "SELECT {BLOC_COLS} FROM blocs WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Bloc::from).collect())
    }

    async fn children_of(&self, parent: Uuid) -> Result<Vec<Bloc>, AppError> {
        let rows = sqlx::query_as::<_, BlocRow>(&format!(
            "SELECT {BLOC_COLS} FROM blocs WHERE parent_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(parent)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Bloc::from).collect())
    }

    async fn roots_of(&self, warehouse: Uuid) -> Result<Vec<Bloc>, AppError> {
        let rows = sqlx::query_as::<_, BlocRow>(&format!(
            "SELECT {BLOC_COLS} FROM blocs \
             WHERE warehouse_id = $1 AND parent_id IS NULL ORDER BY created_at ASC, id ASC"
        ))
        .bind(warehouse)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Bloc::from).collect())
    }

    async fn in_warehouse(&self, warehouse: Uuid) -> Result<Vec<Bloc>, AppError> {
        let rows = sqlx::query_as::<_, BlocRow>(&format!(
            "SELECT {BLOC_COLS} FROM blocs WHERE warehouse_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(warehouse)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Bloc::from).collect())
    }

    async fn update(&self, b: &Bloc) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE blocs SET name = $2, picture = $3, parent_id = $4, width = $5, height = $6, \
             depth = $7, weight = $8, max_weight = $9, pos_x = $10, pos_y = $11, tags = $12, \
             custom_fields = $13, warehouse_id = $14, last_update = $15 WHERE id = $1",
        )
        .bind(b.id)
        .bind(&b.name)
        .bind(&b.picture)
        .bind(b.parent())
        .bind(b.width)
        .bind(b.height)
        .bind(b.depth)
        .bind(b.weight)
        .bind(b.max_weight)
        .bind(b.position.x)
        .bind(b.position.y)
        .bind(&b.tags)
        .bind(Json(&b.custom_fields))
        .bind(b.warehouse)
        .bind(b.last_update)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM blocs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TagStore for PgStore {
    async fn insert(&self, t: &Tag) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO tags (id, name, color, warehouse_id, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(t.id)
        .bind(&t.name)
        .bind(&t.color)
        .bind(t.warehouse)
        .bind(t.created_by)
        .bind(t.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Tag>, AppError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, warehouse_id, created_by, created_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Tag::from))
    }

    async fn in_warehouse(&self, warehouse: Uuid) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, color, warehouse_id, created_by, created_at FROM tags \
             WHERE warehouse_id = $1 ORDER BY created_at ASC",
        )
        .bind(warehouse)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn update(&self, t: &Tag) -> Result<(), AppError> {
        sqlx::query("UPDATE tags SET name = $2, color = $3 WHERE id = $1")
            .bind(t.id)
            .bind(&t.name)
            .bind(&t.color)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn insert(&self, n: &Note) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO notes (id, content, bloc_id, user_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(n.id)
        .bind(&n.content)
        .bind(n.bloc)
        .bind(n.user)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Note>, AppError> {
        let row = sqlx::query_as::<_, NoteRow>(
            "SELECT id, content, bloc_id, user_id, created_at FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Note::from))
    }

    async fn for_bloc(&self, bloc: Uuid) -> Result<Vec<Note>, AppError> {
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, content, bloc_id, user_id, created_at FROM notes \
             WHERE bloc_id = $1 ORDER BY created_at ASC",
        )
        .bind(bloc)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_for_bloc(&self, bloc: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM notes WHERE bloc_id = $1")
            .bind(bloc)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
