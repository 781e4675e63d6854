// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use amilyar_app::{
    BarangayFormInput, BarangayId, BuildingCodeFormInput, BuildingComponentFormInput,
    BuildingComponentId, BuildingSubComponentFormInput, ClassificationFormInput, ClassificationId,
    DeclarantFormInput, DeclarantStatus, DeviceFormInput, KindFormInput, LandAdjustmentFormInput,
    StructureFormInput, StructureId, SubclassFormInput, SubclassId, SubclassRateFormInput,
    TaxRateFormInput, UserId, UserRole,
};
use std::path::PathBuf;

const CLASSIFICATIONS: [&str; 6] = [
    "RESIDENTIAL",
    "COMMERCIAL",
    "AGRICULTURAL",
    "INDUSTRIAL",
    "MINERAL",
    "SPECIAL",
];

const SUBCLASS_PREFIXES: [&str; 5] = ["R", "C", "A", "I", "S"];

const BARANGAYS: [&str; 12] = [
    "Poblacion",
    "San Isidro",
    "San Roque",
    "Santa Cruz",
    "Bagong Silang",
    "Malinta",
    "Mabini",
    "Rizal",
    "Del Pilar",
    "Maligaya",
    "Bagumbayan",
    "Santo Nino",
];

const STRUCTURE_DESCRIPTIONS: [&str; 5] = [
    "Reinforced concrete",
    "Mixed concrete and timber",
    "Strong timber",
    "Light materials",
    "Salvaged materials",
];

const BUILDING_USES: [&str; 6] = [
    "One-storey residential",
    "Two-storey residential",
    "Apartment / rowhouse",
    "Commercial building",
    "Warehouse",
    "Mixed-use building",
];

const COMPONENT_NAMES: [&str; 6] = [
    "Roofing",
    "Flooring",
    "Walling",
    "Ceiling",
    "Doors and windows",
    "Electrical",
];

const SUB_COMPONENT_MATERIALS: [&str; 8] = [
    "Galvanized iron sheets",
    "Clay tiles",
    "Concrete slab",
    "Ceramic tiles",
    "Narra planks",
    "Plywood panels",
    "Aluminum frames",
    "Hardiflex boards",
];

const ADJUSTMENT_DESCRIPTIONS: [&str; 6] = [
    "Corner lot",
    "Interior lot",
    "Fronting national road",
    "Irregular shape",
    "Low-lying / flood prone",
    "With right of way",
];

const DEVICE_NAMES: [&str; 6] = [
    "Field tablet",
    "Office workstation",
    "Survey laptop",
    "Backup tablet",
    "Counter terminal",
    "Mobile phone",
];

const FIRST_NAMES: [&str; 10] = [
    "Alma", "Benito", "Carmela", "Diego", "Elena", "Felipe", "Gloria", "Hector", "Imelda", "Jaime",
];
const LAST_NAMES: [&str; 10] = [
    "Reyes",
    "Cruz",
    "Santos",
    "Garcia",
    "Dela Cruz",
    "Ramos",
    "Mendoza",
    "Aquino",
    "Villanueva",
    "Bautista",
];

const DECLARANT_NAMES: [&str; 8] = [
    "Maria Santos",
    "Jose Dela Cruz",
    "Pedro Ramos",
    "Ana Mendoza",
    "Lito Aquino",
    "Rosa Villanueva",
    "Carlos Bautista",
    "Nena Garcia",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Registration payload the faker emits for user accounts; tests map it
/// onto the store's user creation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSpec {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Deterministic generator of assessment office records. The same seed
/// always yields the same sequence, so tests can assert on exact values.
#[derive(Debug, Clone)]
pub struct RptFaker {
    rng: DeterministicRng,
    counter: u64,
}

impl RptFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            counter: 0,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    fn next_counter(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    pub fn classification(&mut self) -> ClassificationFormInput {
        ClassificationFormInput {
            classification: self.pick(&CLASSIFICATIONS).to_owned(),
        }
    }

    pub fn subclass(&mut self, class_id: ClassificationId) -> SubclassFormInput {
        let prefix = self.pick(&SUBCLASS_PREFIXES);
        let number = self.rng.int_n(4) + 1;
        SubclassFormInput {
            class_id,
            barangay_id: None,
            subclass: format!("{prefix}-{number}"),
        }
    }

    pub fn subclass_in_barangay(
        &mut self,
        class_id: ClassificationId,
        barangay_id: BarangayId,
    ) -> SubclassFormInput {
        let mut input = self.subclass(class_id);
        input.barangay_id = Some(barangay_id);
        input
    }

    pub fn subclass_rate(&mut self, subclass_id: SubclassId) -> SubclassRateFormInput {
        SubclassRateFormInput {
            subclass_id,
            rate: (self.rng.int_n(40) as f64 + 1.0) * 25.0,
            effective_year: self.effective_year(),
        }
    }

    pub fn barangay(&mut self) -> BarangayFormInput {
        BarangayFormInput {
            district_id: 1,
            barangay: self.pick(&BARANGAYS).to_owned(),
        }
    }

    pub fn kind(&mut self) -> KindFormInput {
        let suffix = self.next_counter();
        KindFormInput {
            description: format!("SPECIAL-{suffix}"),
        }
    }

    pub fn structure(&mut self) -> StructureFormInput {
        let roman = ["I", "II", "III", "IV", "V"][self.rng.int_n(5)];
        let letter = ["A", "B", "C"][self.rng.int_n(3)];
        StructureFormInput {
            structure_code: format!("{roman}-{letter}"),
            description: self.pick(&STRUCTURE_DESCRIPTIONS).to_owned(),
            effective_date: None,
        }
    }

    pub fn building_code(&mut self, structure_id: StructureId) -> BuildingCodeFormInput {
        let number = self.rng.int_n(9) + 1;
        BuildingCodeFormInput {
            structure_id,
            building_code: format!("RC-{number}"),
            description: self.pick(&BUILDING_USES).to_owned(),
            rate: (self.rng.int_n(80) as f64 + 20.0) * 100.0,
        }
    }

    pub fn building_component(&mut self) -> BuildingComponentFormInput {
        BuildingComponentFormInput {
            description: self.pick(&COMPONENT_NAMES).to_owned(),
        }
    }

    pub fn building_sub_component(
        &mut self,
        building_com_id: BuildingComponentId,
    ) -> BuildingSubComponentFormInput {
        let percent = self.rng.bool();
        let rate = if percent {
            self.rng.int_n(100) as f64 + 1.0
        } else {
            (self.rng.int_n(50) as f64 + 1.0) * 10.0
        };
        BuildingSubComponentFormInput {
            building_com_id,
            description: self.pick(&SUB_COMPONENT_MATERIALS).to_owned(),
            rate,
            percent,
        }
    }

    pub fn land_adjustment(&mut self) -> LandAdjustmentFormInput {
        let premium = self.rng.bool();
        LandAdjustmentFormInput {
            description: self.pick(&ADJUSTMENT_DESCRIPTIONS).to_owned(),
            adjustment_factor: if premium { 1.1 } else { 0.9 },
            adjustment_type: if premium { "premium" } else { "discount" }.to_owned(),
        }
    }

    pub fn tax_rate(&mut self) -> TaxRateFormInput {
        TaxRateFormInput {
            effective_year: self.effective_year(),
            rate_percent: (self.rng.int_n(4) as f64 + 1.0) / 2.0,
        }
    }

    pub fn user(&mut self, role: UserRole) -> UserSpec {
        let first_name = self.pick(&FIRST_NAMES).to_owned();
        let last_name = self.pick(&LAST_NAMES).to_owned();
        let suffix = self.next_counter();
        let username = format!(
            "{}{suffix}",
            first_name.to_lowercase().replace(' ', "")
        );
        UserSpec {
            email: format!("{username}@example.gov.ph"),
            password: format!("pw-{username}"),
            username,
            first_name,
            last_name,
            role,
        }
    }

    pub fn device(&mut self, user_id: UserId) -> DeviceFormInput {
        DeviceFormInput {
            user_id,
            device_name: self.pick(&DEVICE_NAMES).to_owned(),
            registered: self.rng.bool(),
        }
    }

    pub fn declarant(&mut self) -> DeclarantFormInput {
        DeclarantFormInput {
            declarant: self.pick(&DECLARANT_NAMES).to_owned(),
            status: if self.rng.bool() {
                DeclarantStatus::Active
            } else {
                DeclarantStatus::Archived
            },
        }
    }

    fn effective_year(&mut self) -> String {
        (2020 + self.rng.int_n(6) as i32).to_string()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("amilyar.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn default_kinds() -> &'static [&'static str] {
    &["LAND", "BUILDING", "MACHINERY"]
}
