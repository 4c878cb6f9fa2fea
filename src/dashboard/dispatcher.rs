//! # 事件分发器
//!
//! 每种事件只有一个注册点：重复注册会替换旧的处理函数，而不是叠加。
//! 处理函数不直接改动页面，而是返回动作，由调用方统一执行。

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

pub type Handler<E, A> = Box<dyn Fn(&E) -> Option<A> + Send + Sync>;

pub struct EventDispatcher<K, E, A> {
    handlers: HashMap<K, Handler<E, A>>,
}

impl<K, E, A> Default for EventDispatcher<K, E, A> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<K, E, A> EventDispatcher<K, E, A>
where
    K: Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册处理函数，已存在时先移除旧的；返回是否发生了替换。
    pub fn register<F>(&mut self, key: K, handler: F) -> bool
    where
        F: Fn(&E) -> Option<A> + Send + Sync + 'static,
    {
        let replaced = self.handlers.remove(&key).is_some();
        if replaced {
            log::debug!("🔁 替换事件处理函数：{:?}", key);
        }
        self.handlers.insert(key, Box::new(handler));
        replaced
    }

    pub fn unregister(&mut self, key: &K) -> bool {
        self.handlers.remove(key).is_some()
    }

    pub fn is_registered(&self, key: &K) -> bool {
        self.handlers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// 分发事件；没有处理函数或处理函数不关心该事件时返回 `None`。
    pub fn dispatch(&self, key: &K, event: &E) -> Option<A> {
        let handler = self.handlers.get(key)?;
        handler(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn re_registering_replaces_instead_of_stacking() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher: EventDispatcher<&str, u32, u32> = EventDispatcher::new();

        for _ in 0..3 {
            let calls = calls.clone();
            dispatcher.register("click", move |n| {
                calls.fetch_add(1, Ordering::SeqCst);
                Some(n + 1)
            });
        }

        assert_eq!(dispatcher.len(), 1);
        assert_eq!(dispatcher.dispatch(&"click", &41), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn register_reports_replacement() {
        let mut dispatcher: EventDispatcher<u8, (), ()> = EventDispatcher::new();

        assert!(!dispatcher.register(1, |_| None));
        assert!(dispatcher.register(1, |_| Some(())));
        assert_eq!(dispatcher.dispatch(&1, &()), Some(()));
    }

    #[test]
    fn unknown_key_dispatches_nothing() {
        let mut dispatcher: EventDispatcher<u8, (), ()> = EventDispatcher::new();
        dispatcher.register(1, |_| Some(()));

        assert!(dispatcher.unregister(&1));
        assert!(!dispatcher.is_registered(&1));
        assert_eq!(dispatcher.dispatch(&1, &()), None);
        assert_eq!(dispatcher.dispatch(&2, &()), None);
    }
}
