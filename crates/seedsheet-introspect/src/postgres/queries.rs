use sqlx::PgPool;

use seedsheet_core::{Error, Result};

use crate::mapper::{RawColumn, RawReference, RawTable};

fn db_error(err: sqlx::Error) -> Error {
    Error::Db(err.to_string())
}

pub async fn list_tables(pool: &PgPool) -> Result<Vec<RawTable>> {
    sqlx::query_as::<_, RawTable>(
        r#"
        select
          t.table_schema::text as schema,
          t.table_name::text as name
        from information_schema.tables t
        where t.table_type = 'BASE TABLE'
          and t.table_schema not in ('pg_catalog', 'information_schema')
          and t.table_schema not like 'pg_toast%'
        order by t.table_schema, t.table_name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_columns(pool: &PgPool) -> Result<Vec<RawColumn>> {
    sqlx::query_as::<_, RawColumn>(
        r#"
        select
          c.table_schema::text as schema,
          c.table_name::text as "table",
          c.column_name::text as name,
          c.udt_name::text as native_type,
          c.character_maximum_length::int4 as max_length,
          (c.is_nullable = 'YES') as is_nullable,
          (c.is_identity = 'YES' or coalesce(c.column_default, '') like 'nextval(%') as is_identity,
          (c.is_generated = 'ALWAYS') as is_generated,
          exists (
            select 1
            from information_schema.table_constraints tc
            join information_schema.key_column_usage kcu
              on kcu.constraint_schema = tc.constraint_schema
             and kcu.constraint_name = tc.constraint_name
            where tc.constraint_type = 'PRIMARY KEY'
              and tc.table_schema = c.table_schema
              and tc.table_name = c.table_name
              and kcu.column_name = c.column_name
          ) as is_primary_key
        from information_schema.columns c
        where c.table_schema not in ('pg_catalog', 'information_schema')
        order by c.table_schema, c.table_name, c.ordinal_position
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

pub async fn list_references(pool: &PgPool) -> Result<Vec<RawReference>> {
    sqlx::query_as::<_, RawReference>(
        r#"
        select
          src_nsp.nspname::text as referencing_schema,
          src_rel.relname::text as referencing_table,
          src_att.attname::text as referencing_column,
          ref_nsp.nspname::text as referenced_schema,
          ref_rel.relname::text as referenced_table,
          ref_att.attname::text as referenced_column
        from pg_constraint con
        join pg_class src_rel on src_rel.oid = con.conrelid
        join pg_namespace src_nsp on src_nsp.oid = src_rel.relnamespace
        join pg_class ref_rel on ref_rel.oid = con.confrelid
        join pg_namespace ref_nsp on ref_nsp.oid = ref_rel.relnamespace
        join unnest(con.conkey, con.confkey) as k(src_attnum, ref_attnum) on true
        join pg_attribute src_att on src_att.attrelid = con.conrelid and src_att.attnum = k.src_attnum
        join pg_attribute ref_att on ref_att.attrelid = con.confrelid and ref_att.attnum = k.ref_attnum
        where con.contype = 'f'
        order by src_nsp.nspname, src_rel.relname, con.conname, src_att.attname
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(db_error)
}
