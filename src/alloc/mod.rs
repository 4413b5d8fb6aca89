mod arena;

pub(crate) use self::arena::Arena;
