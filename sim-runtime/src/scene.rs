//! # Scene 模块
//!
//! 场景集合：匿名元素序列 + 按键索引的元素表。
//!
//! ## 绘制顺序
//!
//! 先按顺序绘制匿名元素，再按插入顺序绘制带键元素（后绘制的在上层）。
//!
//! ## 嵌套
//!
//! 集合本身也是 [`Element`]，可以加入另一个集合。绑定会向所有子元素传播；
//! 把集合加入它自己（直接或间接）会被拒绝。
//!
//! ## 快照迭代
//!
//! 绘制和事件分发都在成员快照上进行，回调中增删元素只影响下一帧。

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::element::{Binding, Element, ElementId};
use crate::error::SceneError;
use crate::events::PointerEvent;
use crate::surface::Surface;

#[derive(Default)]
struct SceneMembers {
    anonymous: Vec<Rc<dyn Element>>,
    /// 插入顺序；同键覆盖时保持原位置
    keyed: Vec<(String, Rc<dyn Element>)>,
}

struct SceneInner {
    id: ElementId,
    name: String,
    members: RefCell<SceneMembers>,
    binding: RefCell<Option<Binding>>,
}

/// 场景集合
///
/// 可克隆句柄，克隆共享同一份成员表。
#[derive(Clone)]
pub struct SceneCollection {
    inner: Rc<SceneInner>,
}

impl std::fmt::Debug for SceneCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members = self.inner.members.borrow();
        f.debug_struct("SceneCollection")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("anonymous", &members.anonymous.len())
            .field("keys", &members.keyed.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for SceneCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneCollection {
    pub fn new() -> Self {
        Self::named("")
    }

    pub fn named(name: &str) -> Self {
        Self {
            inner: Rc::new(SceneInner {
                id: ElementId::next(),
                name: name.to_string(),
                members: RefCell::new(SceneMembers::default()),
                binding: RefCell::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // ========== 增删 ==========

    /// 添加元素
    ///
    /// - `key`: `None` 时追加到匿名序列末尾（最上层）；
    ///   已存在的键会被直接替换，旧元素不做任何清理
    pub fn add<E: Element + 'static>(&self, element: E, key: Option<&str>) -> Result<(), SceneError> {
        self.add_element(Rc::new(element), key)
    }

    /// 添加已经共享的元素
    pub fn add_element(&self, element: Rc<dyn Element>, key: Option<&str>) -> Result<(), SceneError> {
        self.check_cycle(element.as_ref())?;
        self.attach(element.as_ref());

        let mut members = self.inner.members.borrow_mut();
        match key {
            None => members.anonymous.push(element),
            Some(key) => match members.keyed.iter_mut().find(|(k, _)| k == key) {
                Some(slot) => {
                    debug!(key = key, "替换同键元素");
                    slot.1 = element;
                }
                None => members.keyed.push((key.to_string(), element)),
            },
        }
        Ok(())
    }

    /// 添加到匿名序列最前面（最先绘制，位于最下层）
    pub fn add_behind<E: Element + 'static>(&self, element: E) -> Result<(), SceneError> {
        let element: Rc<dyn Element> = Rc::new(element);
        self.check_cycle(element.as_ref())?;
        self.attach(element.as_ref());
        self.inner.members.borrow_mut().anonymous.insert(0, element);
        Ok(())
    }

    /// 按键移除，返回被移除的元素
    pub fn remove_with_id(&self, key: &str) -> Option<Rc<dyn Element>> {
        let mut members = self.inner.members.borrow_mut();
        let index = members.keyed.iter().position(|(k, _)| k == key)?;
        Some(members.keyed.remove(index).1)
    }

    /// 按身份移除
    ///
    /// 先在匿名序列中查找，找到第一个就返回；否则移除所有指向该元素的键。
    /// 返回是否移除了任何元素。
    pub fn remove_with_object(&self, element: &dyn Element) -> bool {
        let id = element.id();
        let mut members = self.inner.members.borrow_mut();

        if let Some(index) = members.anonymous.iter().position(|e| e.id() == id) {
            members.anonymous.remove(index);
            return true;
        }

        let before = members.keyed.len();
        members.keyed.retain(|(_, e)| e.id() != id);
        members.keyed.len() != before
    }

    /// 按键查找
    pub fn get(&self, key: &str) -> Option<Rc<dyn Element>> {
        self.inner
            .members
            .borrow()
            .keyed
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, e)| e.clone())
    }

    /// 成员总数（不递归）
    pub fn len(&self) -> usize {
        let members = self.inner.members.borrow();
        members.anonymous.len() + members.keyed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按插入顺序列出键
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .members
            .borrow()
            .keyed
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// 按绘制顺序的成员快照
    pub fn snapshot(&self) -> Vec<Rc<dyn Element>> {
        let members = self.inner.members.borrow();
        members
            .anonymous
            .iter()
            .cloned()
            .chain(members.keyed.iter().map(|(_, e)| e.clone()))
            .collect()
    }

    // ========== 内部 ==========

    fn check_cycle(&self, element: &dyn Element) -> Result<(), SceneError> {
        let id = self.inner.id;
        if element.id() == id || element.contains_element(id) {
            warn!(element = %element.id(), collection = %id, "拒绝插入：会形成环");
            return Err(SceneError::Cycle {
                element: element.id().value(),
                collection: id.value(),
            });
        }
        Ok(())
    }

    fn attach(&self, element: &dyn Element) {
        if let Some(binding) = self.inner.binding.borrow().as_ref() {
            element.bind(binding);
        }
    }
}

impl Element for SceneCollection {
    fn id(&self) -> ElementId {
        self.inner.id
    }

    fn draw(&self, surface: &mut dyn Surface) {
        for element in self.snapshot() {
            element.draw(surface);
        }
    }

    fn bind(&self, binding: &Binding) {
        *self.inner.binding.borrow_mut() = Some(binding.clone());
        for element in self.snapshot() {
            element.bind(binding);
        }
    }

    fn dispatch_pointer(&self, event: &PointerEvent) {
        for element in self.snapshot() {
            element.dispatch_pointer(event);
        }
    }

    fn refresh_hover(&self, event: &PointerEvent) {
        for element in self.snapshot() {
            element.refresh_hover(event);
        }
    }

    fn contains_element(&self, id: ElementId) -> bool {
        self.snapshot()
            .iter()
            .any(|e| e.id() == id || e.contains_element(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;
    use crate::color::Color;
    use crate::element::SimulationElement;
    use crate::scheduler::Scheduler;
    use crate::shapes::Circle;
    use crate::surface::{DrawCommand, RecordingSurface};
    use crate::vector::Point;

    fn circle(x: f64) -> Circle {
        Circle::new(Point::new(x, 0.0), 1.0, Color::BLACK)
    }

    /// 按绘制顺序提取圆心 x 坐标
    fn drawn_xs(scene: &SceneCollection) -> Vec<f64> {
        let mut surface = RecordingSurface::new();
        scene.draw(&mut surface);
        surface
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DrawCommand::Arc { x, .. } => Some(x),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_same_key_replaces() {
        let scene = SceneCollection::new();
        let x = circle(1.0);
        let y = circle(2.0);
        scene.add(x.clone(), Some("a")).unwrap();
        scene.add(y.clone(), Some("a")).unwrap();

        assert_eq!(scene.len(), 1);
        assert_eq!(scene.get("a").map(|e| e.id()), Some(y.id()));
    }

    #[test]
    fn test_draw_order_anonymous_then_keyed() {
        let scene = SceneCollection::new();
        scene.add(circle(10.0), Some("k1")).unwrap();
        scene.add(circle(1.0), None).unwrap();
        scene.add(circle(20.0), Some("k2")).unwrap();
        scene.add(circle(2.0), None).unwrap();
        scene.add_behind(circle(0.0)).unwrap();

        assert_eq!(drawn_xs(&scene), vec![0.0, 1.0, 2.0, 10.0, 20.0]);
        assert_eq!(scene.keys(), vec!["k1", "k2"]);
    }

    #[test]
    fn test_replaced_key_keeps_position() {
        let scene = SceneCollection::new();
        scene.add(circle(1.0), Some("a")).unwrap();
        scene.add(circle(2.0), Some("b")).unwrap();
        scene.add(circle(3.0), Some("a")).unwrap();
        assert_eq!(drawn_xs(&scene), vec![3.0, 2.0]);
    }

    #[test]
    fn test_remove_with_id() {
        let scene = SceneCollection::new();
        scene.add(circle(1.0), Some("a")).unwrap();
        assert!(scene.remove_with_id("a").is_some());
        assert!(scene.remove_with_id("a").is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_remove_with_object_anonymous_first() {
        let scene = SceneCollection::new();
        let shared = circle(1.0);
        scene.add(shared.clone(), None).unwrap();
        scene.add(shared.clone(), None).unwrap();
        scene.add(shared.clone(), Some("a")).unwrap();
        scene.add(shared.clone(), Some("b")).unwrap();

        // 一次只移除一个匿名实例
        assert!(scene.remove_with_object(&shared));
        assert_eq!(scene.len(), 3);
        assert!(scene.remove_with_object(&shared));
        assert_eq!(scene.len(), 2);

        // 匿名序列中没有了：移除所有带键实例
        assert!(scene.remove_with_object(&shared));
        assert!(scene.is_empty());
        assert!(!scene.remove_with_object(&shared));
    }

    #[test]
    fn test_nested_collection_draws_and_binds() {
        let scheduler = Scheduler::new(FrameClock::new(10.0));
        let root = SceneCollection::named("root");
        let group = SceneCollection::named("group");
        let inner = circle(5.0);
        group.add(inner.clone(), None).unwrap();
        root.add(group.clone(), Some("group")).unwrap();
        root.bind(&Binding::new(&scheduler, "canvas"));

        assert_eq!(drawn_xs(&root), vec![5.0]);
        assert!(inner.core().is_bound());

        // 绑定之后加入的元素立即获得绑定
        let late = circle(6.0);
        group.add(late.clone(), None).unwrap();
        assert!(late.core().is_bound());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let a = SceneCollection::named("a");
        let b = SceneCollection::named("b");
        a.add(b.clone(), None).unwrap();

        assert!(matches!(a.add(a.clone(), None), Err(SceneError::Cycle { .. })));
        assert!(matches!(b.add(a.clone(), Some("loop")), Err(SceneError::Cycle { .. })));
        assert_eq!(b.len(), 0);
        assert!(a.contains_element(b.id()));
    }
}
