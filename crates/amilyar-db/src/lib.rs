// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use amilyar_app::{
    AssessmentLevel, AssessmentLevelFormInput, AssessmentLevelId, Barangay, BarangayFormInput,
    BarangayId, BuildingCode, BuildingCodeFormInput, BuildingCodeId, BuildingComponent,
    BuildingComponentFormInput, BuildingComponentId, BuildingSubComponent,
    BuildingSubComponentFormInput, BuildingSubComponentId, Classification,
    ClassificationFormInput, ClassificationId, Declarant, DeclarantFormInput, DeclarantId,
    DeclarantStatus, Device, DeviceFormInput, DeviceId, Kind, KindFormInput, KindId,
    LandAdjustment, LandAdjustmentFormInput, LandAdjustmentId, Structure, StructureFormInput,
    StructureId, Subclass, SubclassFormInput, SubclassId, SubclassRate, SubclassRateFormInput,
    SubclassRateId, TaxRate, TaxRateFormInput, TaxRateId, User, UserId, UserRole,
};
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub const APP_NAME: &str = "amilyar";

/// Property kinds every deployment starts with. Seeding is idempotent;
/// the drill-down predicates in the console key off these descriptions.
const DEFAULT_KINDS: [&str; 3] = ["LAND", "BUILDING", "MACHINERY"];

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("classifications", &["id", "classification", "created_at"]),
    ("barangays", &["id", "district_id", "barangay", "created_at"]),
    (
        "subclasses",
        &["id", "class_id", "barangay_id", "subclass", "created_at"],
    ),
    (
        "subclass_rates",
        &["id", "subclass_id", "rate", "effective_year", "created_at"],
    ),
    ("kinds", &["id", "description", "created_at"]),
    (
        "assessment_levels",
        &[
            "id",
            "kind_id",
            "class_id",
            "effective_year",
            "range_low",
            "range_high",
            "rate_percent",
            "created_at",
        ],
    ),
    (
        "structures",
        &[
            "id",
            "structure_code",
            "description",
            "effective_date",
            "created_at",
        ],
    ),
    (
        "building_codes",
        &[
            "id",
            "structure_id",
            "building_code",
            "description",
            "rate",
            "created_at",
        ],
    ),
    ("building_components", &["id", "description", "created_at"]),
    (
        "building_sub_components",
        &[
            "id",
            "building_com_id",
            "description",
            "rate",
            "percent",
            "created_at",
        ],
    ),
    (
        "land_adjustments",
        &[
            "id",
            "description",
            "adjustment_factor",
            "adjustment_type",
            "created_at",
        ],
    ),
    (
        "tax_rates",
        &["id", "effective_year", "rate_percent", "created_at"],
    ),
    (
        "users",
        &[
            "id",
            "username",
            "email",
            "first_name",
            "last_name",
            "password_hash",
            "role",
            "suspended",
            "date_registered",
        ],
    ),
    (
        "devices",
        &[
            "id",
            "user_id",
            "device_name",
            "registered",
            "registered_at",
            "created_at",
        ],
    ),
    ("declarants", &["id", "declarant", "status", "created_at"]),
];

struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_subclasses_class_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_subclasses_class_id ON subclasses (class_id);",
    },
    RequiredIndex {
        name: "idx_subclasses_barangay_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_subclasses_barangay_id ON subclasses (barangay_id);",
    },
    RequiredIndex {
        name: "idx_subclass_rates_subclass_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_subclass_rates_subclass_id ON subclass_rates (subclass_id);",
    },
    RequiredIndex {
        name: "idx_barangays_district_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_barangays_district_id ON barangays (district_id);",
    },
    RequiredIndex {
        name: "idx_kinds_description",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_kinds_description ON kinds (description);",
    },
    RequiredIndex {
        name: "idx_assessment_levels_kind_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_assessment_levels_kind_id ON assessment_levels (kind_id);",
    },
    RequiredIndex {
        name: "idx_assessment_levels_class_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_assessment_levels_class_id ON assessment_levels (class_id);",
    },
    RequiredIndex {
        name: "idx_building_codes_structure_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_building_codes_structure_id ON building_codes (structure_id);",
    },
    RequiredIndex {
        name: "idx_building_sub_components_building_com_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_building_sub_components_building_com_id ON building_sub_components (building_com_id);",
    },
    RequiredIndex {
        name: "idx_users_username",
        create_sql: "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username);",
    },
    RequiredIndex {
        name: "idx_devices_user_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_devices_user_id ON devices (user_id);",
    },
];

/// Registration payload for new accounts. The plain-text password never
/// reaches the table; only its digest is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;

        self.seed_defaults()?;
        Ok(())
    }

    pub fn seed_defaults(&self) -> Result<()> {
        let now = now_rfc3339()?;
        for kind in DEFAULT_KINDS {
            self.conn
                .execute(
                    "INSERT OR IGNORE INTO kinds (description, created_at) VALUES (?, ?)",
                    params![kind, now],
                )
                .with_context(|| format!("insert default kind {kind}"))?;
        }
        Ok(())
    }

    /// Populates a fresh database with a small assessment office dataset.
    /// Intended for the --demo flag against an in-memory store.
    pub fn seed_demo_data(&self) -> Result<()> {
        let residential = self.create_classification(&ClassificationFormInput {
            classification: "RESIDENTIAL".to_owned(),
        })?;
        let commercial = self.create_classification(&ClassificationFormInput {
            classification: "COMMERCIAL".to_owned(),
        })?;
        self.create_classification(&ClassificationFormInput {
            classification: "AGRICULTURAL".to_owned(),
        })?;

        let poblacion = self.create_barangay(&BarangayFormInput {
            district_id: 1,
            barangay: "Poblacion".to_owned(),
        })?;
        self.create_barangay(&BarangayFormInput {
            district_id: 1,
            barangay: "San Isidro".to_owned(),
        })?;
        self.create_barangay(&BarangayFormInput {
            district_id: 1,
            barangay: "Bagong Silang".to_owned(),
        })?;

        let r1 = self.create_subclass(&SubclassFormInput {
            class_id: residential,
            barangay_id: Some(poblacion),
            subclass: "R-1".to_owned(),
        })?;
        self.create_subclass(&SubclassFormInput {
            class_id: residential,
            barangay_id: None,
            subclass: "R-2".to_owned(),
        })?;
        self.create_subclass(&SubclassFormInput {
            class_id: commercial,
            barangay_id: Some(poblacion),
            subclass: "C-1".to_owned(),
        })?;

        self.create_subclass_rate(&SubclassRateFormInput {
            subclass_id: r1,
            rate: 500.0,
            effective_year: "2025".to_owned(),
        })?;
        self.create_subclass_rate(&SubclassRateFormInput {
            subclass_id: r1,
            rate: 450.0,
            effective_year: "2022".to_owned(),
        })?;

        let kinds = self.list_kinds()?;
        let kind_id_for = |description: &str| {
            kinds
                .iter()
                .find(|kind| kind.description == description)
                .map(|kind| kind.id)
                .ok_or_else(|| anyhow!("default kind {description} missing"))
        };
        let land = kind_id_for("LAND")?;
        let building = kind_id_for("BUILDING")?;

        self.create_assessment_level(&AssessmentLevelFormInput {
            kind_id: land,
            class_id: Some(residential),
            effective_year: "2025".to_owned(),
            range_low: 0.0,
            range_high: 175_000.0,
            rate_percent: 0.0,
        })?;
        self.create_assessment_level(&AssessmentLevelFormInput {
            kind_id: building,
            class_id: Some(residential),
            effective_year: "2025".to_owned(),
            range_low: 175_000.0,
            range_high: 300_000.0,
            rate_percent: 10.0,
        })?;

        let type_i = self.create_structure(&StructureFormInput {
            structure_code: "I-A".to_owned(),
            description: "Reinforced concrete".to_owned(),
            effective_date: None,
        })?;
        self.create_structure(&StructureFormInput {
            structure_code: "II-A".to_owned(),
            description: "Mixed concrete and timber".to_owned(),
            effective_date: None,
        })?;
        self.create_building_code(&BuildingCodeFormInput {
            structure_id: type_i,
            building_code: "RC-1".to_owned(),
            description: "One-storey residential".to_owned(),
            rate: 8_500.0,
        })?;

        let roofing = self.create_building_component(&BuildingComponentFormInput {
            description: "Roofing".to_owned(),
        })?;
        self.create_building_component(&BuildingComponentFormInput {
            description: "Flooring".to_owned(),
        })?;
        self.create_building_sub_component(&BuildingSubComponentFormInput {
            building_com_id: roofing,
            description: "Galvanized iron sheets".to_owned(),
            rate: 10.0,
            percent: true,
        })?;
        self.create_building_sub_component(&BuildingSubComponentFormInput {
            building_com_id: roofing,
            description: "Clay tiles".to_owned(),
            rate: 350.0,
            percent: false,
        })?;

        self.create_land_adjustment(&LandAdjustmentFormInput {
            description: "Corner lot".to_owned(),
            adjustment_factor: 1.1,
            adjustment_type: "premium".to_owned(),
        })?;
        self.create_land_adjustment(&LandAdjustmentFormInput {
            description: "Interior lot".to_owned(),
            adjustment_factor: 0.9,
            adjustment_type: "discount".to_owned(),
        })?;

        self.create_tax_rate(&TaxRateFormInput {
            effective_year: "2025".to_owned(),
            rate_percent: 2.0,
        })?;
        self.create_tax_rate(&TaxRateFormInput {
            effective_year: "2025".to_owned(),
            rate_percent: 1.0,
        })?;

        let admin = self.create_user(&NewUser {
            username: "admin".to_owned(),
            email: "admin@example.gov.ph".to_owned(),
            first_name: "Alma".to_owned(),
            last_name: "Reyes".to_owned(),
            password: "admin".to_owned(),
            role: UserRole::Admin,
        })?;
        let assessor = self.create_user(&NewUser {
            username: "assessor1".to_owned(),
            email: "assessor1@example.gov.ph".to_owned(),
            first_name: "Benito".to_owned(),
            last_name: "Cruz".to_owned(),
            password: "assessor1".to_owned(),
            role: UserRole::Assessor,
        })?;
        self.create_device(&DeviceFormInput {
            user_id: admin,
            device_name: "Office workstation".to_owned(),
            registered: true,
        })?;
        self.create_device(&DeviceFormInput {
            user_id: assessor,
            device_name: "Field tablet".to_owned(),
            registered: false,
        })?;

        self.create_declarant(&DeclarantFormInput {
            declarant: "Maria Santos".to_owned(),
            status: DeclarantStatus::Active,
        })?;
        self.create_declarant(&DeclarantFormInput {
            declarant: "Jose Dela Cruz".to_owned(),
            status: DeclarantStatus::Archived,
        })?;

        Ok(())
    }

    pub fn list_classifications(&self) -> Result<Vec<Classification>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, classification, created_at
                FROM classifications
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare classifications query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(2)?;
                Ok(Classification {
                    id: ClassificationId::new(row.get(0)?),
                    classification: row.get(1)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query classifications")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect classifications")
    }

    pub fn create_classification(
        &self,
        input: &ClassificationFormInput,
    ) -> Result<ClassificationId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO classifications (classification, created_at) VALUES (?, ?)",
                params![input.classification.trim(), now],
            )
            .context("insert classification")?;
        Ok(ClassificationId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_classification(
        &self,
        classification_id: ClassificationId,
        input: &ClassificationFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE classifications SET classification = ? WHERE id = ?",
                params![input.classification.trim(), classification_id.get()],
            )
            .context("update classification")?;
        if rows_affected == 0 {
            bail!(
                "classification {} not found -- refresh the list and retry",
                classification_id.get()
            );
        }
        Ok(())
    }

    /// Number of subclasses still referencing a classification. The
    /// console refuses the delete prompt while this is non-zero.
    pub fn count_subclasses(&self, classification_id: ClassificationId) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM subclasses WHERE class_id = ?",
                params![classification_id.get()],
                |row| row.get(0),
            )
            .context("count subclasses for classification")
    }

    pub fn delete_classification(&self, classification_id: ClassificationId) -> Result<()> {
        let dependents = self.count_subclasses(classification_id)?;
        if dependents > 0 {
            bail!(
                "cannot delete classification {} because {dependents} subclass(es) reference it; delete subclasses first",
                classification_id.get()
            );
        }
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM classifications WHERE id = ?",
                params![classification_id.get()],
            )
            .context("delete classification")?;
        if rows_affected == 0 {
            bail!(
                "classification {} not found -- refresh the list and retry",
                classification_id.get()
            );
        }
        Ok(())
    }

    pub fn list_subclasses(&self, classification_id: ClassificationId) -> Result<Vec<Subclass>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, class_id, barangay_id, subclass, created_at
                FROM subclasses
                WHERE class_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare subclasses query")?;
        let rows = stmt
            .query_map(params![classification_id.get()], |row| {
                let barangay_id: Option<i64> = row.get(2)?;
                let created_at_raw: String = row.get(4)?;
                Ok(Subclass {
                    id: SubclassId::new(row.get(0)?),
                    class_id: ClassificationId::new(row.get(1)?),
                    barangay_id: barangay_id.map(BarangayId::new),
                    subclass: row.get(3)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query subclasses")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect subclasses")
    }

    pub fn create_subclass(&self, input: &SubclassFormInput) -> Result<SubclassId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO subclasses (class_id, barangay_id, subclass, created_at)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    input.class_id.get(),
                    input.barangay_id.map(BarangayId::get),
                    input.subclass.trim(),
                    now,
                ],
            )
            .context("insert subclass")?;
        Ok(SubclassId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_subclass(&self, subclass_id: SubclassId, input: &SubclassFormInput) -> Result<()> {
        // The parent key participates in the WHERE clause so an update can
        // never move a row into another classification's scope.
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE subclasses
                SET barangay_id = ?, subclass = ?
                WHERE id = ? AND class_id = ?
                ",
                params![
                    input.barangay_id.map(BarangayId::get),
                    input.subclass.trim(),
                    subclass_id.get(),
                    input.class_id.get(),
                ],
            )
            .context("update subclass")?;
        if rows_affected == 0 {
            bail!(
                "subclass {} not found in classification {} -- refresh the list and retry",
                subclass_id.get(),
                input.class_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_subclass(
        &self,
        subclass_id: SubclassId,
        classification_id: ClassificationId,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM subclasses WHERE id = ? AND class_id = ?",
                params![subclass_id.get(), classification_id.get()],
            )
            .context("delete subclass")?;
        if rows_affected == 0 {
            bail!(
                "subclass {} not found in classification {} -- refresh the list and retry",
                subclass_id.get(),
                classification_id.get()
            );
        }
        Ok(())
    }

    pub fn list_subclass_rates(&self, subclass_id: SubclassId) -> Result<Vec<SubclassRate>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, subclass_id, rate, effective_year, created_at
                FROM subclass_rates
                WHERE subclass_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare subclass rates query")?;
        let rows = stmt
            .query_map(params![subclass_id.get()], |row| {
                let created_at_raw: String = row.get(4)?;
                Ok(SubclassRate {
                    id: SubclassRateId::new(row.get(0)?),
                    subclass_id: SubclassId::new(row.get(1)?),
                    rate: row.get(2)?,
                    effective_year: row.get(3)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query subclass rates")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect subclass rates")
    }

    pub fn create_subclass_rate(&self, input: &SubclassRateFormInput) -> Result<SubclassRateId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO subclass_rates (subclass_id, rate, effective_year, created_at)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    input.subclass_id.get(),
                    input.rate,
                    input.effective_year.trim(),
                    now,
                ],
            )
            .context("insert subclass rate")?;
        Ok(SubclassRateId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_subclass_rate(
        &self,
        rate_id: SubclassRateId,
        input: &SubclassRateFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE subclass_rates
                SET rate = ?, effective_year = ?
                WHERE id = ? AND subclass_id = ?
                ",
                params![
                    input.rate,
                    input.effective_year.trim(),
                    rate_id.get(),
                    input.subclass_id.get(),
                ],
            )
            .context("update subclass rate")?;
        if rows_affected == 0 {
            bail!(
                "rate {} not found in subclass {} -- refresh the list and retry",
                rate_id.get(),
                input.subclass_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_subclass_rate(
        &self,
        rate_id: SubclassRateId,
        subclass_id: SubclassId,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM subclass_rates WHERE id = ? AND subclass_id = ?",
                params![rate_id.get(), subclass_id.get()],
            )
            .context("delete subclass rate")?;
        if rows_affected == 0 {
            bail!(
                "rate {} not found in subclass {} -- refresh the list and retry",
                rate_id.get(),
                subclass_id.get()
            );
        }
        Ok(())
    }

    pub fn list_barangays(&self, district_id: i64) -> Result<Vec<Barangay>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, district_id, barangay, created_at
                FROM barangays
                WHERE district_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare barangays query")?;
        let rows = stmt
            .query_map(params![district_id], |row| {
                let created_at_raw: String = row.get(3)?;
                Ok(Barangay {
                    id: BarangayId::new(row.get(0)?),
                    district_id: row.get(1)?,
                    barangay: row.get(2)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query barangays")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect barangays")
    }

    pub fn create_barangay(&self, input: &BarangayFormInput) -> Result<BarangayId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO barangays (district_id, barangay, created_at) VALUES (?, ?, ?)",
                params![input.district_id, input.barangay.trim(), now],
            )
            .context("insert barangay")?;
        Ok(BarangayId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_barangay(&self, barangay_id: BarangayId, input: &BarangayFormInput) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE barangays SET barangay = ? WHERE id = ? AND district_id = ?",
                params![input.barangay.trim(), barangay_id.get(), input.district_id],
            )
            .context("update barangay")?;
        if rows_affected == 0 {
            bail!(
                "barangay {} not found in district {} -- refresh the list and retry",
                barangay_id.get(),
                input.district_id
            );
        }
        Ok(())
    }

    pub fn delete_barangay(&self, barangay_id: BarangayId, district_id: i64) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM barangays WHERE id = ? AND district_id = ?",
                params![barangay_id.get(), district_id],
            )
            .context("delete barangay")?;
        if rows_affected == 0 {
            bail!(
                "barangay {} not found in district {} -- refresh the list and retry",
                barangay_id.get(),
                district_id
            );
        }
        Ok(())
    }

    pub fn list_kinds(&self) -> Result<Vec<Kind>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, description, created_at
                FROM kinds
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare kinds query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(2)?;
                Ok(Kind {
                    id: KindId::new(row.get(0)?),
                    description: row.get(1)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query kinds")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect kinds")
    }

    pub fn create_kind(&self, input: &KindFormInput) -> Result<KindId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO kinds (description, created_at) VALUES (?, ?)",
                params![input.description.trim(), now],
            )
            .context("insert kind")?;
        Ok(KindId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_kind(&self, kind_id: KindId, input: &KindFormInput) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE kinds SET description = ? WHERE id = ?",
                params![input.description.trim(), kind_id.get()],
            )
            .context("update kind")?;
        if rows_affected == 0 {
            bail!("kind {} not found -- refresh the list and retry", kind_id.get());
        }
        Ok(())
    }

    pub fn delete_kind(&self, kind_id: KindId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM kinds WHERE id = ?", params![kind_id.get()])
            .context("delete kind")?;
        if rows_affected == 0 {
            bail!("kind {} not found -- refresh the list and retry", kind_id.get());
        }
        Ok(())
    }

    pub fn list_assessment_levels(&self, kind_id: KindId) -> Result<Vec<AssessmentLevel>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, kind_id, class_id, effective_year,
                  range_low, range_high, rate_percent, created_at
                FROM assessment_levels
                WHERE kind_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare assessment levels query")?;
        let rows = stmt
            .query_map(params![kind_id.get()], |row| {
                let class_id: Option<i64> = row.get(2)?;
                let created_at_raw: String = row.get(7)?;
                Ok(AssessmentLevel {
                    id: AssessmentLevelId::new(row.get(0)?),
                    kind_id: KindId::new(row.get(1)?),
                    class_id: class_id.map(ClassificationId::new),
                    effective_year: row.get(3)?,
                    range_low: row.get(4)?,
                    range_high: row.get(5)?,
                    rate_percent: row.get(6)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query assessment levels")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect assessment levels")
    }

    pub fn create_assessment_level(
        &self,
        input: &AssessmentLevelFormInput,
    ) -> Result<AssessmentLevelId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO assessment_levels (
                  kind_id, class_id, effective_year,
                  range_low, range_high, rate_percent, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    input.kind_id.get(),
                    input.class_id.map(ClassificationId::get),
                    input.effective_year.trim(),
                    input.range_low,
                    input.range_high,
                    input.rate_percent,
                    now,
                ],
            )
            .context("insert assessment level")?;
        Ok(AssessmentLevelId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_assessment_level(
        &self,
        level_id: AssessmentLevelId,
        input: &AssessmentLevelFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE assessment_levels
                SET
                  class_id = ?,
                  effective_year = ?,
                  range_low = ?,
                  range_high = ?,
                  rate_percent = ?
                WHERE id = ? AND kind_id = ?
                ",
                params![
                    input.class_id.map(ClassificationId::get),
                    input.effective_year.trim(),
                    input.range_low,
                    input.range_high,
                    input.rate_percent,
                    level_id.get(),
                    input.kind_id.get(),
                ],
            )
            .context("update assessment level")?;
        if rows_affected == 0 {
            bail!(
                "assessment level {} not found in kind {} -- refresh the list and retry",
                level_id.get(),
                input.kind_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_assessment_level(
        &self,
        level_id: AssessmentLevelId,
        kind_id: KindId,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM assessment_levels WHERE id = ? AND kind_id = ?",
                params![level_id.get(), kind_id.get()],
            )
            .context("delete assessment level")?;
        if rows_affected == 0 {
            bail!(
                "assessment level {} not found in kind {} -- refresh the list and retry",
                level_id.get(),
                kind_id.get()
            );
        }
        Ok(())
    }

    pub fn list_structures(&self) -> Result<Vec<Structure>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, structure_code, description, effective_date, created_at
                FROM structures
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare structures query")?;
        let rows = stmt
            .query_map([], |row| {
                let effective_date_raw: Option<String> = row.get(3)?;
                let created_at_raw: String = row.get(4)?;
                Ok(Structure {
                    id: StructureId::new(row.get(0)?),
                    structure_code: row.get(1)?,
                    description: row.get(2)?,
                    effective_date: parse_opt_date(effective_date_raw).map_err(to_sql_error)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query structures")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect structures")
    }

    pub fn create_structure(&self, input: &StructureFormInput) -> Result<StructureId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO structures (structure_code, description, effective_date, created_at)
                VALUES (?, ?, ?, ?)
                ",
                params![
                    input.structure_code.trim(),
                    input.description.trim(),
                    input.effective_date.map(format_date),
                    now,
                ],
            )
            .context("insert structure")?;
        Ok(StructureId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_structure(&self, structure_id: StructureId, input: &StructureFormInput) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE structures
                SET structure_code = ?, description = ?, effective_date = ?
                WHERE id = ?
                ",
                params![
                    input.structure_code.trim(),
                    input.description.trim(),
                    input.effective_date.map(format_date),
                    structure_id.get(),
                ],
            )
            .context("update structure")?;
        if rows_affected == 0 {
            bail!(
                "structure {} not found -- refresh the list and retry",
                structure_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_structure(&self, structure_id: StructureId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM structures WHERE id = ?",
                params![structure_id.get()],
            )
            .context("delete structure")?;
        if rows_affected == 0 {
            bail!(
                "structure {} not found -- refresh the list and retry",
                structure_id.get()
            );
        }
        Ok(())
    }

    pub fn list_building_codes(&self, structure_id: StructureId) -> Result<Vec<BuildingCode>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, structure_id, building_code, description, rate, created_at
                FROM building_codes
                WHERE structure_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare building codes query")?;
        let rows = stmt
            .query_map(params![structure_id.get()], |row| {
                let created_at_raw: String = row.get(5)?;
                Ok(BuildingCode {
                    id: BuildingCodeId::new(row.get(0)?),
                    structure_id: StructureId::new(row.get(1)?),
                    building_code: row.get(2)?,
                    description: row.get(3)?,
                    rate: row.get(4)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query building codes")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect building codes")
    }

    pub fn create_building_code(&self, input: &BuildingCodeFormInput) -> Result<BuildingCodeId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO building_codes (
                  structure_id, building_code, description, rate, created_at
                ) VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    input.structure_id.get(),
                    input.building_code.trim(),
                    input.description.trim(),
                    input.rate,
                    now,
                ],
            )
            .context("insert building code")?;
        Ok(BuildingCodeId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_building_code(
        &self,
        code_id: BuildingCodeId,
        input: &BuildingCodeFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE building_codes
                SET building_code = ?, description = ?, rate = ?
                WHERE id = ? AND structure_id = ?
                ",
                params![
                    input.building_code.trim(),
                    input.description.trim(),
                    input.rate,
                    code_id.get(),
                    input.structure_id.get(),
                ],
            )
            .context("update building code")?;
        if rows_affected == 0 {
            bail!(
                "building code {} not found in structure {} -- refresh the list and retry",
                code_id.get(),
                input.structure_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_building_code(
        &self,
        code_id: BuildingCodeId,
        structure_id: StructureId,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM building_codes WHERE id = ? AND structure_id = ?",
                params![code_id.get(), structure_id.get()],
            )
            .context("delete building code")?;
        if rows_affected == 0 {
            bail!(
                "building code {} not found in structure {} -- refresh the list and retry",
                code_id.get(),
                structure_id.get()
            );
        }
        Ok(())
    }

    pub fn list_building_components(&self) -> Result<Vec<BuildingComponent>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, description, created_at
                FROM building_components
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare building components query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(2)?;
                Ok(BuildingComponent {
                    id: BuildingComponentId::new(row.get(0)?),
                    description: row.get(1)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query building components")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect building components")
    }

    pub fn create_building_component(
        &self,
        input: &BuildingComponentFormInput,
    ) -> Result<BuildingComponentId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO building_components (description, created_at) VALUES (?, ?)",
                params![input.description.trim(), now],
            )
            .context("insert building component")?;
        Ok(BuildingComponentId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_building_component(
        &self,
        component_id: BuildingComponentId,
        input: &BuildingComponentFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE building_components SET description = ? WHERE id = ?",
                params![input.description.trim(), component_id.get()],
            )
            .context("update building component")?;
        if rows_affected == 0 {
            bail!(
                "component {} not found -- refresh the list and retry",
                component_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_building_component(&self, component_id: BuildingComponentId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM building_components WHERE id = ?",
                params![component_id.get()],
            )
            .context("delete building component")?;
        if rows_affected == 0 {
            bail!(
                "component {} not found -- refresh the list and retry",
                component_id.get()
            );
        }
        Ok(())
    }

    pub fn list_building_sub_components(
        &self,
        component_id: BuildingComponentId,
    ) -> Result<Vec<BuildingSubComponent>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, building_com_id, description, rate, percent, created_at
                FROM building_sub_components
                WHERE building_com_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare building sub-components query")?;
        let rows = stmt
            .query_map(params![component_id.get()], |row| {
                let created_at_raw: String = row.get(5)?;
                Ok(BuildingSubComponent {
                    id: BuildingSubComponentId::new(row.get(0)?),
                    building_com_id: BuildingComponentId::new(row.get(1)?),
                    description: row.get(2)?,
                    rate: row.get(3)?,
                    percent: row.get(4)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query building sub-components")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect building sub-components")
    }

    pub fn create_building_sub_component(
        &self,
        input: &BuildingSubComponentFormInput,
    ) -> Result<BuildingSubComponentId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO building_sub_components (
                  building_com_id, description, rate, percent, created_at
                ) VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    input.building_com_id.get(),
                    input.description.trim(),
                    input.rate,
                    input.percent,
                    now,
                ],
            )
            .context("insert building sub-component")?;
        Ok(BuildingSubComponentId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_building_sub_component(
        &self,
        sub_component_id: BuildingSubComponentId,
        input: &BuildingSubComponentFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE building_sub_components
                SET description = ?, rate = ?, percent = ?
                WHERE id = ? AND building_com_id = ?
                ",
                params![
                    input.description.trim(),
                    input.rate,
                    input.percent,
                    sub_component_id.get(),
                    input.building_com_id.get(),
                ],
            )
            .context("update building sub-component")?;
        if rows_affected == 0 {
            bail!(
                "sub-component {} not found in component {} -- refresh the list and retry",
                sub_component_id.get(),
                input.building_com_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_building_sub_component(
        &self,
        sub_component_id: BuildingSubComponentId,
        component_id: BuildingComponentId,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM building_sub_components WHERE id = ? AND building_com_id = ?",
                params![sub_component_id.get(), component_id.get()],
            )
            .context("delete building sub-component")?;
        if rows_affected == 0 {
            bail!(
                "sub-component {} not found in component {} -- refresh the list and retry",
                sub_component_id.get(),
                component_id.get()
            );
        }
        Ok(())
    }

    pub fn list_land_adjustments(&self) -> Result<Vec<LandAdjustment>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, description, adjustment_factor, adjustment_type, created_at
                FROM land_adjustments
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare land adjustments query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(4)?;
                Ok(LandAdjustment {
                    id: LandAdjustmentId::new(row.get(0)?),
                    description: row.get(1)?,
                    adjustment_factor: row.get(2)?,
                    adjustment_type: row.get(3)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query land adjustments")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect land adjustments")
    }

    pub fn create_land_adjustment(
        &self,
        input: &LandAdjustmentFormInput,
    ) -> Result<LandAdjustmentId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO land_adjustments (
                  description, adjustment_factor, adjustment_type, created_at
                ) VALUES (?, ?, ?, ?)
                ",
                params![
                    input.description.trim(),
                    input.adjustment_factor,
                    input.adjustment_type.trim(),
                    now,
                ],
            )
            .context("insert land adjustment")?;
        Ok(LandAdjustmentId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_land_adjustment(
        &self,
        adjustment_id: LandAdjustmentId,
        input: &LandAdjustmentFormInput,
    ) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE land_adjustments
                SET description = ?, adjustment_factor = ?, adjustment_type = ?
                WHERE id = ?
                ",
                params![
                    input.description.trim(),
                    input.adjustment_factor,
                    input.adjustment_type.trim(),
                    adjustment_id.get(),
                ],
            )
            .context("update land adjustment")?;
        if rows_affected == 0 {
            bail!(
                "adjustment {} not found -- refresh the list and retry",
                adjustment_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_land_adjustment(&self, adjustment_id: LandAdjustmentId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM land_adjustments WHERE id = ?",
                params![adjustment_id.get()],
            )
            .context("delete land adjustment")?;
        if rows_affected == 0 {
            bail!(
                "adjustment {} not found -- refresh the list and retry",
                adjustment_id.get()
            );
        }
        Ok(())
    }

    pub fn list_tax_rates(&self) -> Result<Vec<TaxRate>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, effective_year, rate_percent, created_at
                FROM tax_rates
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare tax rates query")?;
        let rows = stmt
            .query_map([], |row| {
                let created_at_raw: String = row.get(3)?;
                Ok(TaxRate {
                    id: TaxRateId::new(row.get(0)?),
                    effective_year: row.get(1)?,
                    rate_percent: row.get(2)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query tax rates")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect tax rates")
    }

    pub fn create_tax_rate(&self, input: &TaxRateFormInput) -> Result<TaxRateId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO tax_rates (effective_year, rate_percent, created_at) VALUES (?, ?, ?)",
                params![input.effective_year.trim(), input.rate_percent, now],
            )
            .context("insert tax rate")?;
        Ok(TaxRateId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_tax_rate(&self, rate_id: TaxRateId, input: &TaxRateFormInput) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE tax_rates SET effective_year = ?, rate_percent = ? WHERE id = ?",
                params![input.effective_year.trim(), input.rate_percent, rate_id.get()],
            )
            .context("update tax rate")?;
        if rows_affected == 0 {
            bail!(
                "tax rate {} not found -- refresh the list and retry",
                rate_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_tax_rate(&self, rate_id: TaxRateId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM tax_rates WHERE id = ?", params![rate_id.get()])
            .context("delete tax rate")?;
        if rows_affected == 0 {
            bail!(
                "tax rate {} not found -- refresh the list and retry",
                rate_id.get()
            );
        }
        Ok(())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT
                  id, username, email, first_name, last_name,
                  role, suspended, date_registered
                FROM users
                ORDER BY date_registered DESC, id DESC
                ",
            )
            .context("prepare users query")?;
        let rows = stmt
            .query_map([], |row| {
                let role_raw: String = row.get(5)?;
                let role = UserRole::parse(&role_raw).ok_or_else(|| {
                    to_sql_error(anyhow!("unknown user role {role_raw}"))
                })?;
                let date_registered_raw: String = row.get(7)?;
                Ok(User {
                    id: UserId::new(row.get(0)?),
                    username: row.get(1)?,
                    email: row.get(2)?,
                    first_name: row.get(3)?,
                    last_name: row.get(4)?,
                    role,
                    suspended: row.get(6)?,
                    date_registered: parse_datetime(&date_registered_raw).map_err(to_sql_error)?,
                })
            })
            .context("query users")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect users")
    }

    pub fn get_user(&self, user_id: UserId) -> Result<User> {
        self.conn
            .query_row(
                "
                SELECT
                  id, username, email, first_name, last_name,
                  role, suspended, date_registered
                FROM users
                WHERE id = ?
                ",
                params![user_id.get()],
                |row| {
                    let role_raw: String = row.get(5)?;
                    let role = UserRole::parse(&role_raw).ok_or_else(|| {
                        to_sql_error(anyhow!("unknown user role {role_raw}"))
                    })?;
                    let date_registered_raw: String = row.get(7)?;
                    Ok(User {
                        id: UserId::new(row.get(0)?),
                        username: row.get(1)?,
                        email: row.get(2)?,
                        first_name: row.get(3)?,
                        last_name: row.get(4)?,
                        role,
                        suspended: row.get(6)?,
                        date_registered: parse_datetime(&date_registered_raw)
                            .map_err(to_sql_error)?,
                    })
                },
            )
            .with_context(|| format!("load user {}", user_id.get()))
    }

    pub fn find_user_id_by_username(&self, username: &str) -> Result<Option<UserId>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE username = ?",
                params![username],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("look up user {username:?}"))?;
        Ok(id.map(UserId::new))
    }

    pub fn create_user(&self, new_user: &NewUser) -> Result<UserId> {
        if new_user.username.trim().is_empty() {
            bail!("username is required -- enter a username and retry");
        }
        if new_user.password.is_empty() {
            bail!("password is required -- enter a password and retry");
        }
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO users (
                  username, email, first_name, last_name,
                  password_hash, role, suspended, date_registered
                ) VALUES (?, ?, ?, ?, ?, ?, 0, ?)
                ",
                params![
                    new_user.username.trim(),
                    new_user.email.trim(),
                    new_user.first_name.trim(),
                    new_user.last_name.trim(),
                    hash_password(&new_user.password),
                    new_user.role.as_str(),
                    now,
                ],
            )
            .context("insert user")?;
        Ok(UserId::new(self.conn.last_insert_rowid()))
    }

    /// Checks an administrator's credentials. The account must exist, hold
    /// the admin role, not be suspended, and present the right password.
    pub fn verify_admin_password(&self, admin_id: UserId, password: &str) -> Result<()> {
        let record: Option<(String, String, bool)> = self
            .conn
            .query_row(
                "SELECT password_hash, role, suspended FROM users WHERE id = ?",
                params![admin_id.get()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context("load admin credentials")?;

        let Some((password_hash, role_raw, suspended)) = record else {
            bail!("admin account {} not found", admin_id.get());
        };
        if UserRole::parse(&role_raw) != Some(UserRole::Admin) {
            bail!("account {} is not an administrator", admin_id.get());
        }
        if suspended {
            bail!("admin account {} is suspended", admin_id.get());
        }
        if hash_password(password) != password_hash {
            bail!("incorrect password -- check the password and retry");
        }
        Ok(())
    }

    /// Toggles suspension on a user after re-verifying the acting admin.
    /// Admins cannot suspend themselves or other administrators.
    pub fn suspend_user_verified(
        &self,
        admin_id: UserId,
        target_id: UserId,
        password: &str,
        suspend: bool,
    ) -> Result<()> {
        self.verify_admin_password(admin_id, password)?;
        if admin_id == target_id {
            bail!("you cannot suspend your own account");
        }
        let target = self.get_user(target_id)?;
        if target.role == UserRole::Admin {
            bail!("administrator accounts cannot be suspended from the console");
        }
        let rows_affected = self
            .conn
            .execute(
                "UPDATE users SET suspended = ? WHERE id = ?",
                params![suspend, target_id.get()],
            )
            .context("update user suspension")?;
        if rows_affected == 0 {
            bail!(
                "user {} not found -- refresh the list and retry",
                target_id.get()
            );
        }
        Ok(())
    }

    /// Deletes a user after re-verifying the acting admin. Registered
    /// devices go with the account. Same self/admin protections as
    /// suspension.
    pub fn delete_user_verified(
        &self,
        admin_id: UserId,
        target_id: UserId,
        password: &str,
    ) -> Result<()> {
        self.verify_admin_password(admin_id, password)?;
        if admin_id == target_id {
            bail!("you cannot delete your own account");
        }
        let target = self.get_user(target_id)?;
        if target.role == UserRole::Admin {
            bail!("administrator accounts cannot be deleted from the console");
        }
        let rows_affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", params![target_id.get()])
            .context("delete user")?;
        if rows_affected == 0 {
            bail!(
                "user {} not found -- refresh the list and retry",
                target_id.get()
            );
        }
        Ok(())
    }

    pub fn list_devices(&self, user_id: UserId) -> Result<Vec<Device>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, user_id, device_name, registered, registered_at, created_at
                FROM devices
                WHERE user_id = ?
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare devices query")?;
        let rows = stmt
            .query_map(params![user_id.get()], |row| {
                let registered_at_raw: Option<String> = row.get(4)?;
                let created_at_raw: String = row.get(5)?;
                Ok(Device {
                    id: DeviceId::new(row.get(0)?),
                    user_id: UserId::new(row.get(1)?),
                    device_name: row.get(2)?,
                    registered: row.get(3)?,
                    registered_at: parse_opt_datetime(registered_at_raw).map_err(to_sql_error)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query devices")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect devices")
    }

    pub fn create_device(&self, input: &DeviceFormInput) -> Result<DeviceId> {
        let now = now_rfc3339()?;
        let registered_at = input.registered.then(|| now.clone());
        self.conn
            .execute(
                "
                INSERT INTO devices (user_id, device_name, registered, registered_at, created_at)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    input.user_id.get(),
                    input.device_name.trim(),
                    input.registered,
                    registered_at,
                    now,
                ],
            )
            .context("insert device")?;
        Ok(DeviceId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_device(&self, device_id: DeviceId, input: &DeviceFormInput) -> Result<()> {
        let now = now_rfc3339()?;
        // registered_at records the first approval and is cleared again
        // when registration is revoked.
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE devices
                SET
                  device_name = ?,
                  registered = ?,
                  registered_at = CASE
                    WHEN ? THEN COALESCE(registered_at, ?)
                    ELSE NULL
                  END
                WHERE id = ? AND user_id = ?
                ",
                params![
                    input.device_name.trim(),
                    input.registered,
                    input.registered,
                    now,
                    device_id.get(),
                    input.user_id.get(),
                ],
            )
            .context("update device")?;
        if rows_affected == 0 {
            bail!(
                "device {} not found for user {} -- refresh the list and retry",
                device_id.get(),
                input.user_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_device(&self, device_id: DeviceId, user_id: UserId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM devices WHERE id = ? AND user_id = ?",
                params![device_id.get(), user_id.get()],
            )
            .context("delete device")?;
        if rows_affected == 0 {
            bail!(
                "device {} not found for user {} -- refresh the list and retry",
                device_id.get(),
                user_id.get()
            );
        }
        Ok(())
    }

    pub fn list_declarants(&self) -> Result<Vec<Declarant>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, declarant, status, created_at
                FROM declarants
                ORDER BY created_at DESC, id DESC
                ",
            )
            .context("prepare declarants query")?;
        let rows = stmt
            .query_map([], |row| {
                let status_raw: String = row.get(2)?;
                let status = DeclarantStatus::parse(&status_raw).ok_or_else(|| {
                    to_sql_error(anyhow!("unknown declarant status {status_raw}"))
                })?;
                let created_at_raw: String = row.get(3)?;
                Ok(Declarant {
                    id: DeclarantId::new(row.get(0)?),
                    declarant: row.get(1)?,
                    status,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query declarants")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect declarants")
    }

    pub fn create_declarant(&self, input: &DeclarantFormInput) -> Result<DeclarantId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO declarants (declarant, status, created_at) VALUES (?, ?, ?)",
                params![input.declarant.trim(), input.status.as_str(), now],
            )
            .context("insert declarant")?;
        Ok(DeclarantId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_declarant(&self, declarant_id: DeclarantId, input: &DeclarantFormInput) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "UPDATE declarants SET declarant = ?, status = ? WHERE id = ?",
                params![input.declarant.trim(), input.status.as_str(), declarant_id.get()],
            )
            .context("update declarant")?;
        if rows_affected == 0 {
            bail!(
                "declarant {} not found -- refresh the list and retry",
                declarant_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_declarant(&self, declarant_id: DeclarantId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "DELETE FROM declarants WHERE id = ?",
                params![declarant_id.get()],
            )
            .context("delete declarant")?;
        if rows_affected == 0 {
            bail!(
                "declarant {} not found -- refresh the list and retry",
                declarant_id.get()
            );
        }
        Ok(())
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("AMILYAR_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set AMILYAR_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("amilyar.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use an amilyar-compatible database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }

    let existing_indexes = index_names(conn)?;
    let missing = REQUIRED_INDEXES
        .iter()
        .filter(|index| !existing_indexes.contains(index.name))
        .map(|index| index.name)
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!(
            "database is missing required indexes: {}; run migration before launching",
            missing.join(", ")
        );
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn index_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(
            "
            SELECT name
            FROM sqlite_master
            WHERE type = 'index'
              AND name NOT LIKE 'sqlite_%'
            ORDER BY name ASC
            ",
        )
        .context("prepare index names query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("query index names")?;
    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("collect index names")
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn parse_date(raw: &str) -> Result<Date> {
    if let Ok(value) = Date::parse(raw, &format_description!("[year]-[month]-[day]")) {
        return Ok(value);
    }

    // Imported rows may store date values as full timestamps.
    let date_time = parse_datetime(raw)?;
    Ok(date_time.date())
}

fn parse_opt_datetime(raw: Option<String>) -> Result<Option<OffsetDateTime>> {
    raw.as_deref().map(parse_datetime).transpose()
}

fn parse_opt_date(raw: Option<String>) -> Result<Option<Date>> {
    raw.as_deref().map(parse_date).transpose()
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}

fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut output = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
