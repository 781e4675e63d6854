// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use amilyar_app::{
    AssessmentLevelId, BarangayId, BuildingCodeId, BuildingComponentId, BuildingSubComponentId,
    ClassificationId, DeclarantId, DeviceId, FormPayload, KindId, LandAdjustmentId, Row,
    ScreenKind, StructureId, SubclassId, SubclassRateId, TaxRateId, UserId,
};
use amilyar_db::Store;

/// Bridges the terminal UI to the SQLite store. User suspensions and
/// deletions re-verify the configured operator's password here rather
/// than in the UI.
pub struct DbRuntime<'a> {
    store: &'a Store,
    operator: String,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, operator: &str) -> Self {
        Self {
            store,
            operator: operator.to_owned(),
        }
    }

    fn operator_id(&self) -> Result<UserId> {
        match self.store.find_user_id_by_username(&self.operator)? {
            Some(id) => Ok(id),
            None => bail!(
                "operator account {:?} not found -- set [ui].operator to an admin username",
                self.operator
            ),
        }
    }
}

fn scope_key(parent_key: Option<i64>, screen: ScreenKind) -> Result<i64> {
    parent_key.ok_or_else(|| anyhow!("{} require a parent row", screen.label()))
}

impl amilyar_tui::AppRuntime for DbRuntime<'_> {
    fn load_rows(&mut self, screen: ScreenKind, parent_key: Option<i64>) -> Result<Vec<Row>> {
        let rows = match screen {
            ScreenKind::Classification => self
                .store
                .list_classifications()?
                .into_iter()
                .map(Row::Classification)
                .collect(),
            ScreenKind::Subclass => {
                let class_id = ClassificationId::new(scope_key(parent_key, screen)?);
                self.store
                    .list_subclasses(class_id)?
                    .into_iter()
                    .map(Row::Subclass)
                    .collect()
            }
            ScreenKind::SubclassRate => {
                let subclass_id = SubclassId::new(scope_key(parent_key, screen)?);
                self.store
                    .list_subclass_rates(subclass_id)?
                    .into_iter()
                    .map(Row::SubclassRate)
                    .collect()
            }
            ScreenKind::Barangay => {
                let district_id = scope_key(parent_key, screen)?;
                self.store
                    .list_barangays(district_id)?
                    .into_iter()
                    .map(Row::Barangay)
                    .collect()
            }
            ScreenKind::Kind => self
                .store
                .list_kinds()?
                .into_iter()
                .map(Row::Kind)
                .collect(),
            ScreenKind::AssessmentLevel => {
                let kind_id = KindId::new(scope_key(parent_key, screen)?);
                self.store
                    .list_assessment_levels(kind_id)?
                    .into_iter()
                    .map(Row::AssessmentLevel)
                    .collect()
            }
            ScreenKind::Structure => self
                .store
                .list_structures()?
                .into_iter()
                .map(Row::Structure)
                .collect(),
            ScreenKind::BuildingCode => {
                let structure_id = StructureId::new(scope_key(parent_key, screen)?);
                self.store
                    .list_building_codes(structure_id)?
                    .into_iter()
                    .map(Row::BuildingCode)
                    .collect()
            }
            ScreenKind::BuildingComponent => self
                .store
                .list_building_components()?
                .into_iter()
                .map(Row::BuildingComponent)
                .collect(),
            ScreenKind::BuildingSubComponent => {
                let component_id = BuildingComponentId::new(scope_key(parent_key, screen)?);
                self.store
                    .list_building_sub_components(component_id)?
                    .into_iter()
                    .map(Row::BuildingSubComponent)
                    .collect()
            }
            ScreenKind::LandAdjustment => self
                .store
                .list_land_adjustments()?
                .into_iter()
                .map(Row::LandAdjustment)
                .collect(),
            ScreenKind::TaxRate => self
                .store
                .list_tax_rates()?
                .into_iter()
                .map(Row::TaxRate)
                .collect(),
            ScreenKind::User => self
                .store
                .list_users()?
                .into_iter()
                .map(Row::User)
                .collect(),
            ScreenKind::Device => {
                let user_id = UserId::new(scope_key(parent_key, screen)?);
                self.store
                    .list_devices(user_id)?
                    .into_iter()
                    .map(Row::Device)
                    .collect()
            }
            ScreenKind::Declarant => self
                .store
                .list_declarants()?
                .into_iter()
                .map(Row::Declarant)
                .collect(),
        };
        Ok(rows)
    }

    fn create_row(&mut self, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        match payload {
            FormPayload::Classification(form) => {
                self.store.create_classification(form)?;
            }
            FormPayload::Subclass(form) => {
                self.store.create_subclass(form)?;
            }
            FormPayload::SubclassRate(form) => {
                self.store.create_subclass_rate(form)?;
            }
            FormPayload::Barangay(form) => {
                self.store.create_barangay(form)?;
            }
            FormPayload::Kind(form) => {
                self.store.create_kind(form)?;
            }
            FormPayload::AssessmentLevel(form) => {
                self.store.create_assessment_level(form)?;
            }
            FormPayload::Structure(form) => {
                self.store.create_structure(form)?;
            }
            FormPayload::BuildingCode(form) => {
                self.store.create_building_code(form)?;
            }
            FormPayload::BuildingComponent(form) => {
                self.store.create_building_component(form)?;
            }
            FormPayload::BuildingSubComponent(form) => {
                self.store.create_building_sub_component(form)?;
            }
            FormPayload::LandAdjustment(form) => {
                self.store.create_land_adjustment(form)?;
            }
            FormPayload::TaxRate(form) => {
                self.store.create_tax_rate(form)?;
            }
            FormPayload::Device(form) => {
                self.store.create_device(form)?;
            }
            FormPayload::Declarant(form) => {
                self.store.create_declarant(form)?;
            }
        }
        Ok(())
    }

    fn update_row(&mut self, row_id: i64, payload: &FormPayload) -> Result<()> {
        payload.validate()?;
        match payload {
            FormPayload::Classification(form) => self
                .store
                .update_classification(ClassificationId::new(row_id), form),
            FormPayload::Subclass(form) => {
                self.store.update_subclass(SubclassId::new(row_id), form)
            }
            FormPayload::SubclassRate(form) => self
                .store
                .update_subclass_rate(SubclassRateId::new(row_id), form),
            FormPayload::Barangay(form) => {
                self.store.update_barangay(BarangayId::new(row_id), form)
            }
            FormPayload::Kind(form) => self.store.update_kind(KindId::new(row_id), form),
            FormPayload::AssessmentLevel(form) => self
                .store
                .update_assessment_level(AssessmentLevelId::new(row_id), form),
            FormPayload::Structure(form) => {
                self.store.update_structure(StructureId::new(row_id), form)
            }
            FormPayload::BuildingCode(form) => self
                .store
                .update_building_code(BuildingCodeId::new(row_id), form),
            FormPayload::BuildingComponent(form) => self
                .store
                .update_building_component(BuildingComponentId::new(row_id), form),
            FormPayload::BuildingSubComponent(form) => self
                .store
                .update_building_sub_component(BuildingSubComponentId::new(row_id), form),
            FormPayload::LandAdjustment(form) => self
                .store
                .update_land_adjustment(LandAdjustmentId::new(row_id), form),
            FormPayload::TaxRate(form) => {
                self.store.update_tax_rate(TaxRateId::new(row_id), form)
            }
            FormPayload::Device(form) => self.store.update_device(DeviceId::new(row_id), form),
            FormPayload::Declarant(form) => {
                self.store.update_declarant(DeclarantId::new(row_id), form)
            }
        }
    }

    fn delete_row(
        &mut self,
        screen: ScreenKind,
        row_id: i64,
        parent_key: Option<i64>,
    ) -> Result<()> {
        match screen {
            ScreenKind::Classification => self
                .store
                .delete_classification(ClassificationId::new(row_id)),
            ScreenKind::Subclass => self.store.delete_subclass(
                SubclassId::new(row_id),
                ClassificationId::new(scope_key(parent_key, screen)?),
            ),
            ScreenKind::SubclassRate => self.store.delete_subclass_rate(
                SubclassRateId::new(row_id),
                SubclassId::new(scope_key(parent_key, screen)?),
            ),
            ScreenKind::Barangay => self
                .store
                .delete_barangay(BarangayId::new(row_id), scope_key(parent_key, screen)?),
            ScreenKind::Kind => self.store.delete_kind(KindId::new(row_id)),
            ScreenKind::AssessmentLevel => self.store.delete_assessment_level(
                AssessmentLevelId::new(row_id),
                KindId::new(scope_key(parent_key, screen)?),
            ),
            ScreenKind::Structure => self.store.delete_structure(StructureId::new(row_id)),
            ScreenKind::BuildingCode => self.store.delete_building_code(
                BuildingCodeId::new(row_id),
                StructureId::new(scope_key(parent_key, screen)?),
            ),
            ScreenKind::BuildingComponent => self
                .store
                .delete_building_component(BuildingComponentId::new(row_id)),
            ScreenKind::BuildingSubComponent => self.store.delete_building_sub_component(
                BuildingSubComponentId::new(row_id),
                BuildingComponentId::new(scope_key(parent_key, screen)?),
            ),
            ScreenKind::LandAdjustment => self
                .store
                .delete_land_adjustment(LandAdjustmentId::new(row_id)),
            ScreenKind::TaxRate => self.store.delete_tax_rate(TaxRateId::new(row_id)),
            ScreenKind::User => bail!("user accounts are deleted with password confirmation"),
            ScreenKind::Device => self.store.delete_device(
                DeviceId::new(row_id),
                UserId::new(scope_key(parent_key, screen)?),
            ),
            ScreenKind::Declarant => self.store.delete_declarant(DeclarantId::new(row_id)),
        }
    }

    fn count_delete_dependents(&mut self, screen: ScreenKind, row_id: i64) -> Result<usize> {
        match screen.delete_dependent() {
            Some(ScreenKind::Subclass) => {
                let count = self.store.count_subclasses(ClassificationId::new(row_id))?;
                Ok(usize::try_from(count).unwrap_or(0))
            }
            _ => Ok(0),
        }
    }

    fn set_user_suspended(&mut self, target: UserId, password: &str, suspend: bool) -> Result<()> {
        let admin_id = self.operator_id()?;
        self.store
            .suspend_user_verified(admin_id, target, password, suspend)
    }

    fn delete_user(&mut self, target: UserId, password: &str) -> Result<()> {
        let admin_id = self.operator_id()?;
        self.store.delete_user_verified(admin_id, target, password)
    }
}
