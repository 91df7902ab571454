// ==========================================
// 组合导入引擎 - 翻译聚合器
// ==========================================
// 两阶段: add() 累积 → optimize() 去重 → into_translations() 输出
// 去重策略: item/fluid 为规范文本；与之重复的机器/配方翻译被删除，
//           目标翻译打上 duplicated-by 标志
// 顺序: 先机器后配方，目标先 item 后 fluid
// ==========================================

use crate::domain::{LocalisedString, Translation, TranslationType};
use crate::importer::identity::assign_id;
use std::collections::BTreeMap;
use uuid::Uuid;

/// 翻译键 (locale, type, name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TranslationKey {
    pub locale: String,
    pub translation_type: TranslationType,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct TranslationEntry {
    value: String,
    description: String,
    is_duplicated_by_machine: bool,
    is_duplicated_by_recipe: bool,
}

const DONOR_PASSES: [TranslationType; 2] = [TranslationType::Machine, TranslationType::Recipe];
const TARGET_TYPES: [TranslationType; 2] = [TranslationType::Item, TranslationType::Fluid];

#[derive(Debug, Default)]
pub struct TranslationAggregator {
    entries: BTreeMap<TranslationKey, TranslationEntry>,
}

impl TranslationAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累积一个实体的多语言文本
    ///
    /// 同键多次调用按字段合并：非空的 value / description 各自覆盖
    pub fn add(
        &mut self,
        translation_type: TranslationType,
        name: &str,
        labels: &LocalisedString,
        descriptions: &LocalisedString,
    ) {
        for (locale, value) in labels {
            let entry = self.entry(locale, translation_type, name);
            if !value.is_empty() {
                entry.value = value.clone();
            }
        }
        for (locale, description) in descriptions {
            let entry = self.entry(locale, translation_type, name);
            if !description.is_empty() {
                entry.description = description.clone();
            }
        }
    }

    fn entry(
        &mut self,
        locale: &str,
        translation_type: TranslationType,
        name: &str,
    ) -> &mut TranslationEntry {
        self.entries
            .entry(TranslationKey {
                locale: locale.to_string(),
                translation_type,
                name: name.to_string(),
            })
            .or_default()
    }

    /// 删除与 item/fluid 重复的机器/配方翻译
    ///
    /// 返回被删除的条目数
    pub fn optimize(&mut self) -> usize {
        let mut removed = 0;

        for donor_type in DONOR_PASSES {
            let donor_keys: Vec<TranslationKey> = self
                .entries
                .keys()
                .filter(|key| key.translation_type == donor_type)
                .cloned()
                .collect();

            for donor_key in donor_keys {
                let Some(donor) = self.entries.get(&donor_key).cloned() else {
                    continue;
                };

                // 同名的物品与流体都可能与之重复，全部打标
                let mut duplicated = false;
                for target_type in TARGET_TYPES {
                    let target_key = TranslationKey {
                        translation_type: target_type,
                        ..donor_key.clone()
                    };
                    let Some(target) = self.entries.get_mut(&target_key) else {
                        continue;
                    };

                    let same_description =
                        donor.description.is_empty() || donor.description == target.description;
                    if target.value != donor.value || !same_description {
                        continue;
                    }

                    match donor_type {
                        TranslationType::Machine => target.is_duplicated_by_machine = true,
                        _ => target.is_duplicated_by_recipe = true,
                    }
                    duplicated = true;
                }

                if duplicated {
                    self.entries.remove(&donor_key);
                    removed += 1;
                }
            }
        }

        removed
    }

    /// 扁平化输出（按键排序）并计算标识
    pub fn into_translations(self) -> Vec<Translation> {
        self.entries
            .into_iter()
            .map(|(key, entry)| {
                assign_id(Translation {
                    id: Uuid::nil(),
                    locale: key.locale,
                    translation_type: key.translation_type,
                    name: key.name,
                    value: entry.value,
                    description: entry.description,
                    is_duplicated_by_machine: entry.is_duplicated_by_machine,
                    is_duplicated_by_recipe: entry.is_duplicated_by_recipe,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(pairs: &[(&str, &str)]) -> LocalisedString {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn find<'a>(
        translations: &'a [Translation],
        translation_type: TranslationType,
        name: &str,
    ) -> Option<&'a Translation> {
        translations
            .iter()
            .find(|t| t.translation_type == translation_type && t.name == name)
    }

    #[test]
    fn test_add_merges_fields_per_key() {
        let mut aggregator = TranslationAggregator::new();
        aggregator.add(
            TranslationType::Item,
            "iron-plate",
            &text(&[("en", "Iron plate")]),
            &LocalisedString::new(),
        );
        aggregator.add(
            TranslationType::Item,
            "iron-plate",
            &text(&[("en", "")]),
            &text(&[("en", "A plate of iron")]),
        );

        let translations = aggregator.into_translations();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0].value, "Iron plate");
        assert_eq!(translations[0].description, "A plate of iron");
    }

    #[test]
    fn test_machine_duplicate_with_empty_description_is_removed() {
        let mut aggregator = TranslationAggregator::new();
        aggregator.add(
            TranslationType::Item,
            "iron-plate",
            &text(&[("en", "Iron plate")]),
            &LocalisedString::new(),
        );
        aggregator.add(
            TranslationType::Machine,
            "iron-plate",
            &text(&[("en", "Iron plate")]),
            &LocalisedString::new(),
        );

        assert_eq!(aggregator.optimize(), 1);
        let translations = aggregator.into_translations();
        assert!(find(&translations, TranslationType::Machine, "iron-plate").is_none());
        let item = find(&translations, TranslationType::Item, "iron-plate").unwrap();
        assert!(item.is_duplicated_by_machine);
        assert!(!item.is_duplicated_by_recipe);
    }

    #[test]
    fn test_machine_with_different_description_is_kept() {
        let mut aggregator = TranslationAggregator::new();
        aggregator.add(
            TranslationType::Item,
            "iron-plate",
            &text(&[("en", "Iron plate")]),
            &text(&[("en", "Smelted iron")]),
        );
        aggregator.add(
            TranslationType::Machine,
            "iron-plate",
            &text(&[("en", "Iron plate")]),
            &text(&[("en", "Something else")]),
        );

        assert_eq!(aggregator.optimize(), 0);
        let translations = aggregator.into_translations();
        assert!(find(&translations, TranslationType::Machine, "iron-plate").is_some());
        assert!(!find(&translations, TranslationType::Item, "iron-plate").unwrap().is_duplicated_by_machine);
    }

    #[test]
    fn test_recipe_pass_targets_fluid_and_respects_locale() {
        let mut aggregator = TranslationAggregator::new();
        aggregator.add(
            TranslationType::Fluid,
            "water",
            &text(&[("en", "Water"), ("de", "Wasser")]),
            &LocalisedString::new(),
        );
        aggregator.add(
            TranslationType::Recipe,
            "water",
            &text(&[("en", "Water"), ("de", "Wasser (Pumpe)")]),
            &LocalisedString::new(),
        );

        assert_eq!(aggregator.optimize(), 1);
        let translations = aggregator.into_translations();
        let de_recipe = translations
            .iter()
            .find(|t| t.locale == "de" && t.translation_type == TranslationType::Recipe);
        assert!(de_recipe.is_some());
        let en_fluid = translations
            .iter()
            .find(|t| t.locale == "en" && t.translation_type == TranslationType::Fluid)
            .unwrap();
        assert!(en_fluid.is_duplicated_by_recipe);
    }

    #[test]
    fn test_both_passes_flag_same_item() {
        let mut aggregator = TranslationAggregator::new();
        for translation_type in [
            TranslationType::Item,
            TranslationType::Machine,
            TranslationType::Recipe,
        ] {
            aggregator.add(
                translation_type,
                "assembler",
                &text(&[("en", "Assembler")]),
                &LocalisedString::new(),
            );
        }

        assert_eq!(aggregator.optimize(), 2);
        let translations = aggregator.into_translations();
        assert_eq!(translations.len(), 1);
        assert!(translations[0].is_duplicated_by_machine);
        assert!(translations[0].is_duplicated_by_recipe);
    }

    #[test]
    fn test_machine_duplicate_flags_item_and_fluid() {
        let mut aggregator = TranslationAggregator::new();
        for translation_type in [
            TranslationType::Item,
            TranslationType::Fluid,
            TranslationType::Machine,
        ] {
            aggregator.add(
                translation_type,
                "water",
                &text(&[("en", "Water")]),
                &LocalisedString::new(),
            );
        }

        // 机器条目只删除一次
        assert_eq!(aggregator.optimize(), 1);
        let translations = aggregator.into_translations();
        assert_eq!(translations.len(), 2);
        assert!(find(&translations, TranslationType::Machine, "water").is_none());
        assert!(find(&translations, TranslationType::Item, "water").unwrap().is_duplicated_by_machine);
        assert!(find(&translations, TranslationType::Fluid, "water").unwrap().is_duplicated_by_machine);
    }

    #[test]
    fn test_output_is_key_ordered_with_identities() {
        let mut aggregator = TranslationAggregator::new();
        aggregator.add(TranslationType::Recipe, "b", &text(&[("en", "B")]), &LocalisedString::new());
        aggregator.add(TranslationType::Item, "a", &text(&[("en", "A")]), &LocalisedString::new());

        let translations = aggregator.into_translations();
        assert_eq!(translations[0].translation_type, TranslationType::Item);
        assert!(translations.iter().all(|t| !t.id.is_nil()));
    }
}
