// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(ClassificationId);
entity_id!(SubclassId);
entity_id!(SubclassRateId);
entity_id!(BarangayId);
entity_id!(KindId);
entity_id!(AssessmentLevelId);
entity_id!(StructureId);
entity_id!(BuildingCodeId);
entity_id!(BuildingComponentId);
entity_id!(BuildingSubComponentId);
entity_id!(LandAdjustmentId);
entity_id!(TaxRateId);
entity_id!(UserId);
entity_id!(DeviceId);
entity_id!(DeclarantId);
