//! # Snapshot 模块
//!
//! 两级属性快照缓存。
//!
//! - **初始快照（pristine）**：元素首次即将显示时的属性集合，代表"设计稿状态"，
//!   只写一次，除非显式清除
//! - **恢复列表（restore）**：每次过渡重建，记录过渡结束后需要还原到初始快照的元素
//!
//! 过渡的"起点"取实时属性，"终点"取初始快照，因此从半途状态重新发起过渡也能收敛到设计稿。

use std::collections::{BTreeMap, HashMap};

use crate::config::MagicConfig;
use crate::element::ElementId;
use crate::host::SceneHost;
use crate::property::PropertyMap;

/// 读取元素的实时属性
///
/// 对每个参与过渡的属性读取内联值，未设置时使用配置默认值；
/// 两者都没有时该属性不出现在结果中。
pub fn live_properties<H: SceneHost + ?Sized>(
    host: &H,
    element: ElementId,
    config: &MagicConfig,
) -> PropertyMap {
    let mut properties = PropertyMap::new();
    for name in config.effective_properties() {
        let value = host
            .style_property(element, name)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| config.property_defaults.get(name).cloned());
        if let Some(value) = value {
            properties.insert(name, value);
        }
    }
    properties
}

/// 属性快照存储
#[derive(Debug, Default)]
pub struct PropertySnapshotStore {
    /// 初始快照（元素 → 属性集合）
    pristine: HashMap<ElementId, PropertyMap>,
    /// 本次过渡的恢复列表
    restore: BTreeMap<ElementId, PropertyMap>,
}

impl PropertySnapshotStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 初始快照 ==========

    /// 若元素尚无初始快照，则记录其当前实时属性
    ///
    /// # 返回
    /// - `true`: 本次新记录了快照
    /// - `false`: 已存在快照，未读取实时属性
    pub fn capture_pristine_if_absent<H: SceneHost + ?Sized>(
        &mut self,
        host: &H,
        element: ElementId,
        config: &MagicConfig,
    ) -> bool {
        if self.pristine.contains_key(&element) {
            return false;
        }
        self.pristine
            .insert(element, live_properties(host, element, config));
        true
    }

    /// 获取初始快照
    pub fn pristine(&self, element: ElementId) -> Option<&PropertyMap> {
        self.pristine.get(&element)
    }

    /// 是否已有初始快照
    pub fn has_pristine(&self, element: ElementId) -> bool {
        self.pristine.contains_key(&element)
    }

    /// 清除初始快照（`None` 清除全部）
    pub fn clear_pristine(&mut self, element: Option<ElementId>) {
        match element {
            Some(element) => {
                self.pristine.remove(&element);
            }
            None => self.pristine.clear(),
        }
    }

    /// 回收一组元素的快照（场景销毁时调用）
    pub fn release(&mut self, elements: &[ElementId]) {
        for element in elements {
            self.pristine.remove(element);
            self.restore.remove(element);
        }
    }

    /// 回收整个场景（根元素及全部后代）的快照
    pub fn release_scene<H: SceneHost + ?Sized>(&mut self, host: &H, root: ElementId) {
        let mut elements = host.descendants(root);
        elements.push(root);
        self.release(&elements);
    }

    /// 初始快照数量
    pub fn pristine_count(&self) -> usize {
        self.pristine.len()
    }

    // ========== 恢复列表 ==========

    /// 清空恢复列表（每次过渡开始时调用）
    pub fn clear_restore(&mut self) {
        self.restore.clear();
    }

    /// 把元素加入恢复列表
    ///
    /// 没有初始快照的元素不会被加入。
    ///
    /// # 返回
    /// 是否成功加入
    pub fn schedule_restore(&mut self, element: ElementId) -> bool {
        match self.pristine.get(&element) {
            Some(snapshot) => {
                self.restore.insert(element, snapshot.clone());
                true
            }
            None => false,
        }
    }

    /// 元素是否在恢复列表中
    pub fn is_scheduled(&self, element: ElementId) -> bool {
        self.restore.contains_key(&element)
    }

    /// 取出恢复列表
    pub fn take_restore(&mut self) -> Vec<(ElementId, PropertyMap)> {
        std::mem::take(&mut self.restore).into_iter().collect()
    }
}

/// 把属性集合写回元素内联样式
pub fn apply_properties<H: SceneHost + ?Sized>(
    host: &mut H,
    element: ElementId,
    properties: &PropertyMap,
) {
    for (name, value) in properties.iter() {
        host.set_style_property(element, name, Some(value));
    }
}
