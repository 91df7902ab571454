// ==========================================
// 组合导入引擎 - 分部注册表
// ==========================================
// ImportPart → 对账器（编译期映射，无运行时注册）
// ==========================================

use crate::domain::ImportPart;
use crate::importer::crafting_category::CraftingCategoryKind;
use crate::importer::item::ItemKind;
use crate::importer::machine::MachineKind;
use crate::importer::mods::ModKind;
use crate::importer::recipe::RecipeKind;
use crate::importer::reconciler::{EntityReconciler, Reconciler};
use crate::importer::translation::TranslationKind;

impl ImportPart {
    /// 该分部对应的对账器
    pub fn reconciler(&self) -> Box<dyn EntityReconciler> {
        match self {
            ImportPart::Mod => Box::new(Reconciler::<ModKind>::new()),
            ImportPart::CraftingCategory => Box::new(Reconciler::<CraftingCategoryKind>::new()),
            ImportPart::Item => Box::new(Reconciler::<ItemKind>::new()),
            ImportPart::Machine => Box::new(Reconciler::<MachineKind>::new()),
            ImportPart::Recipe => Box::new(Reconciler::<RecipeKind>::new()),
            ImportPart::Translation => Box::new(Reconciler::<TranslationKind>::new()),
        }
    }
}
