//! Idempotent schema setup for the system registry and tenant databases.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`; columns added after
//! a table first shipped go through [`ensure_column`], which consults
//! `information_schema.columns` before issuing the `ALTER TABLE`, so the same
//! migration run is safe against any earlier schema revision.

use sqlx::PgPool;
use tracing::info;

use super::manager::DatabaseError;

/// Tables in the system registry database (`opsdesk_main`)
const SYSTEM_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL UNIQUE,
        database TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Tables in every tenant database
const TENANT_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        hierarchy_level INT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS role_permissions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        role_id UUID NOT NULL REFERENCES roles(id) ON DELETE CASCADE,
        resource TEXT NOT NULL,
        permission TEXT NOT NULL,
        UNIQUE (role_id, resource, permission)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        username TEXT NOT NULL UNIQUE,
        display_name TEXT NOT NULL,
        email TEXT,
        password_hash TEXT NOT NULL,
        role_id UUID REFERENCES roles(id),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_permissions (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        resource TEXT NOT NULL,
        permission TEXT NOT NULL,
        granted BOOLEAN NOT NULL,
        UNIQUE (user_id, resource, permission)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id BIGSERIAL PRIMARY KEY,
        actor_id UUID NOT NULL,
        actor_name TEXT NOT NULL,
        action TEXT NOT NULL,
        resource TEXT NOT NULL,
        record_id UUID,
        before_data JSONB,
        after_data JSONB,
        ip TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS leads (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        company TEXT,
        email TEXT,
        phone TEXT,
        source TEXT,
        status TEXT NOT NULL DEFAULT 'new',
        notes TEXT,
        owner_id UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS proposals (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        number TEXT NOT NULL UNIQUE,
        serial BIGINT NOT NULL UNIQUE,
        client_name TEXT NOT NULL,
        client_email TEXT,
        client_address TEXT,
        line_items JSONB NOT NULL DEFAULT '[]',
        discount_percent NUMERIC(5,2) NOT NULL DEFAULT 0,
        tax_percent NUMERIC(5,2) NOT NULL DEFAULT 0,
        subtotal NUMERIC(14,2) NOT NULL DEFAULT 0,
        total NUMERIC(14,2) NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'draft',
        valid_until DATE,
        created_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        code TEXT NOT NULL UNIQUE,
        serial BIGINT NOT NULL,
        name TEXT NOT NULL,
        client_name TEXT,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'planned',
        start_date DATE,
        end_date DATE,
        budget NUMERIC(14,2),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS purchase_orders (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        number TEXT NOT NULL UNIQUE,
        serial BIGINT NOT NULL UNIQUE,
        supplier_name TEXT NOT NULL,
        supplier_address TEXT,
        line_items JSONB NOT NULL DEFAULT '[]',
        total NUMERIC(14,2) NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'draft',
        expected_date DATE,
        created_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cash_vouchers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        number TEXT NOT NULL UNIQUE,
        serial BIGINT NOT NULL UNIQUE,
        payee TEXT NOT NULL,
        amount NUMERIC(14,2) NOT NULL,
        kind TEXT NOT NULL DEFAULT 'payment',
        description TEXT,
        voucher_date DATE NOT NULL,
        created_by UUID REFERENCES users(id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tickets (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        subject TEXT NOT NULL,
        description TEXT,
        category TEXT NOT NULL DEFAULT 'general',
        status TEXT NOT NULL DEFAULT 'new',
        priority TEXT NOT NULL DEFAULT 'normal',
        opened_by UUID REFERENCES users(id),
        assignee_id UUID REFERENCES users(id),
        resolved_at TIMESTAMPTZ,
        closed_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ticket_comments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        ticket_id UUID NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
        author_id UUID REFERENCES users(id),
        body TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ticket_routes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        category TEXT NOT NULL UNIQUE,
        department TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS holidays (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        holiday_date DATE NOT NULL,
        kind TEXT NOT NULL DEFAULT 'public',
        is_optional BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (holiday_date, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        work_date DATE NOT NULL,
        check_in TIMESTAMPTZ NOT NULL,
        check_out TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (user_id, work_date)
    )
    "#,
];

/// Default roles seeded into every tenant database
const SEED_ROLES: &[(&str, &str, i32)] = &[
    ("administrator", "Full access to every module", 1),
    ("manager", "Works the business documents, read access everywhere", 2),
    ("staff", "Raises leads and tickets, records own attendance", 3),
];

/// Default ticket category -> department routing
const SEED_TICKET_ROUTES: &[(&str, &str)] = &[
    ("billing", "finance"),
    ("technical", "engineering"),
    ("hr", "human_resources"),
    ("general", "operations"),
];

/// Initialize the system registry database
pub async fn migrate_system(pool: &PgPool) -> Result<(), DatabaseError> {
    for ddl in SYSTEM_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    info!("System database schema is up to date");
    Ok(())
}

/// Initialize or upgrade a tenant database
pub async fn migrate_tenant(pool: &PgPool) -> Result<(), DatabaseError> {
    for ddl in TENANT_TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }

    // Columns added after the tables first shipped
    ensure_column(pool, "tickets", "department", "TEXT NOT NULL DEFAULT 'operations'").await?;
    ensure_column(pool, "audit_logs", "user_agent", "TEXT").await?;

    seed_roles(pool).await?;
    seed_ticket_routes(pool).await?;

    info!("Tenant database schema is up to date");
    Ok(())
}

/// Add a column only when `information_schema` says it is missing
async fn ensure_column(
    pool: &PgPool,
    table: &str,
    column: &str,
    definition: &str,
) -> Result<(), DatabaseError> {
    let exists: Option<(i32,)> = sqlx::query_as(
        "SELECT 1 FROM information_schema.columns
         WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2",
    )
    .bind(table)
    .bind(column)
    .fetch_optional(pool)
    .await?;

    if exists.is_none() {
        let ddl = format!("ALTER TABLE \"{}\" ADD COLUMN \"{}\" {}", table, column, definition);
        sqlx::query(&ddl).execute(pool).await?;
        info!("Added column {}.{}", table, column);
    }

    Ok(())
}

async fn seed_roles(pool: &PgPool) -> Result<(), DatabaseError> {
    for (name, description, level) in SEED_ROLES {
        sqlx::query(
            "INSERT INTO roles (name, description, hierarchy_level)
             VALUES ($1, $2, $3)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .bind(level)
        .execute(pool)
        .await?;
    }
    Ok(())
}

async fn seed_ticket_routes(pool: &PgPool) -> Result<(), DatabaseError> {
    for (category, department) in SEED_TICKET_ROUTES {
        sqlx::query(
            "INSERT INTO ticket_routes (category, department)
             VALUES ($1, $2)
             ON CONFLICT (category) DO NOTHING",
        )
        .bind(category)
        .bind(department)
        .execute(pool)
        .await?;
    }
    Ok(())
}
