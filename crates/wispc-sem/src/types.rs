//! Flyweight type representation: every distinct [`TypeKind`] is interned
//! exactly once, so two types are equal iff their handles are equal. Mirrors
//! the original compiler's `BasicType`/`FnType`/`TypeList` singletons, but as
//! an owned arena instead of static pointers.

use rustc_hash::FxHashMap;

use wispc_util::index_vec::{define_idx, IndexVec};

define_idx!(Type);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Int,
    Bool,
    Void,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Basic(BasicKind),
    Immutable(Type),
    TypeList(Vec<Type>),
    Fn { formals: Type, ret: Type },
    /// The type of an already-erroneous expression. Comparisons and checks
    /// against `Error` never produce a further diagnostic, so one mistake
    /// doesn't cascade into a wall of follow-on errors.
    Error,
}

/// Owns every type that has been constructed during analysis, deduplicated
/// by structural equality.
pub struct TypeCtx {
    arena: IndexVec<Type, TypeKind>,
    interned: FxHashMap<TypeKind, Type>,
    int: Type,
    bool_: Type,
    void: Type,
    string: Type,
    error: Type,
}

impl TypeCtx {
    pub fn new() -> Self {
        let mut arena = IndexVec::new();
        let mut interned = FxHashMap::default();

        let mut intern_basic = |arena: &mut IndexVec<Type, TypeKind>, interned: &mut FxHashMap<TypeKind, Type>, kind: BasicKind| {
            let tk = TypeKind::Basic(kind);
            let id = arena.push(tk.clone());
            interned.insert(tk, id);
            id
        };

        let int = intern_basic(&mut arena, &mut interned, BasicKind::Int);
        let bool_ = intern_basic(&mut arena, &mut interned, BasicKind::Bool);
        let void = intern_basic(&mut arena, &mut interned, BasicKind::Void);
        let string = intern_basic(&mut arena, &mut interned, BasicKind::String);

        let error = arena.push(TypeKind::Error);
        interned.insert(TypeKind::Error, error);

        Self { arena, interned, int, bool_, void, string, error }
    }

    fn intern(&mut self, kind: TypeKind) -> Type {
        if let Some(id) = self.interned.get(&kind) {
            return *id;
        }
        let id = self.arena.push(kind.clone());
        self.interned.insert(kind, id);
        id
    }

    pub fn int(&self) -> Type {
        self.int
    }
    pub fn bool_(&self) -> Type {
        self.bool_
    }
    pub fn void(&self) -> Type {
        self.void
    }
    pub fn string(&self) -> Type {
        self.string
    }
    pub fn error(&self) -> Type {
        self.error
    }

    pub fn immutable(&mut self, inner: Type) -> Type {
        self.intern(TypeKind::Immutable(inner))
    }

    pub fn type_list(&mut self, elems: Vec<Type>) -> Type {
        self.intern(TypeKind::TypeList(elems))
    }

    pub fn function(&mut self, formals: Type, ret: Type) -> Type {
        self.intern(TypeKind::Fn { formals, ret })
    }

    pub fn kind(&self, ty: Type) -> &TypeKind {
        &self.arena[ty]
    }

    /// Unwraps an `immutable` wrapper, if any, returning the underlying type.
    pub fn strip_immutable(&self, ty: Type) -> Type {
        match self.kind(ty) {
            TypeKind::Immutable(inner) => self.strip_immutable(*inner),
            _ => ty,
        }
    }

    pub fn is_error(&self, ty: Type) -> bool {
        matches!(self.kind(ty), TypeKind::Error)
    }

    pub fn is_int(&self, ty: Type) -> bool {
        matches!(self.kind(self.strip_immutable(ty)), TypeKind::Basic(BasicKind::Int))
    }

    pub fn is_bool(&self, ty: Type) -> bool {
        matches!(self.kind(self.strip_immutable(ty)), TypeKind::Basic(BasicKind::Bool))
    }

    pub fn is_void(&self, ty: Type) -> bool {
        matches!(self.kind(self.strip_immutable(ty)), TypeKind::Basic(BasicKind::Void))
    }

    pub fn is_string(&self, ty: Type) -> bool {
        matches!(self.kind(self.strip_immutable(ty)), TypeKind::Basic(BasicKind::String))
    }

    pub fn is_fn(&self, ty: Type) -> bool {
        matches!(self.kind(ty), TypeKind::Fn { .. })
    }

    pub fn is_immutable(&self, ty: Type) -> bool {
        matches!(self.kind(ty), TypeKind::Immutable(_))
    }

    /// A variable may be declared with any type except `void`. Function
    /// types are allowed here (the original's `FnType::validVarType`
    /// always returns `true`), even though nothing in the surface grammar
    /// can currently declare a variable of function type.
    pub fn valid_var_type(&self, ty: Type) -> bool {
        let stripped = self.strip_immutable(ty);
        !self.is_void(stripped) && !self.is_error(stripped)
    }

    /// Two types are assignment/equality-compatible if they're identical
    /// once both sides have had any `immutable` wrapper stripped; an
    /// `Error` type is always compatible with anything (cascade
    /// suppression).
    pub fn compatible(&self, a: Type, b: Type) -> bool {
        if self.is_error(a) || self.is_error(b) {
            return true;
        }
        self.strip_immutable(a) == self.strip_immutable(b)
    }

    /// Number of formals in a `TypeList`; used for the System V stack
    /// alignment check in codegen. The original compiler used
    /// `TypeList::getSize()` (total byte size) for this check, which is
    /// wrong when not every formal is 8 bytes-equivalent; this counts
    /// actual formals instead.
    pub fn formal_count(&self, type_list: Type) -> usize {
        match self.kind(type_list) {
            TypeKind::TypeList(elems) => elems.len(),
            _ => 0,
        }
    }

    pub fn display(&self, ty: Type) -> String {
        match self.kind(ty) {
            TypeKind::Basic(BasicKind::Int) => "int".to_string(),
            TypeKind::Basic(BasicKind::Bool) => "bool".to_string(),
            TypeKind::Basic(BasicKind::Void) => "void".to_string(),
            TypeKind::Basic(BasicKind::String) => "string".to_string(),
            TypeKind::Immutable(inner) => format!("immutable {}", self.display(*inner)),
            TypeKind::TypeList(elems) => elems
                .iter()
                .map(|t| self.display(*t))
                .collect::<Vec<_>>()
                .join(","),
            TypeKind::Fn { formals, ret } => format!("({}) -> {}", self.display(*formals), self.display(*ret)),
            TypeKind::Error => "error".to_string(),
        }
    }
}

impl Default for TypeCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basics_are_interned_singletons() {
        let ctx = TypeCtx::new();
        assert_eq!(ctx.int(), ctx.int());
        assert_ne!(ctx.int(), ctx.bool_());
    }

    #[test]
    fn structurally_equal_types_share_a_handle() {
        let mut ctx = TypeCtx::new();
        let a = ctx.immutable(ctx.int());
        let b = ctx.immutable(ctx.int());
        assert_eq!(a, b);
    }

    #[test]
    fn immutable_int_is_still_int() {
        let mut ctx = TypeCtx::new();
        let imm = ctx.immutable(ctx.int());
        assert!(ctx.is_int(imm));
    }

    #[test]
    fn void_is_not_a_valid_var_type_but_fn_is() {
        let mut ctx = TypeCtx::new();
        assert!(!ctx.valid_var_type(ctx.void()));
        let f = ctx.function(ctx.void(), ctx.int());
        assert!(ctx.valid_var_type(f));
        assert!(ctx.valid_var_type(ctx.int()));
    }

    #[test]
    fn error_is_compatible_with_anything() {
        let ctx = TypeCtx::new();
        assert!(ctx.compatible(ctx.error(), ctx.int()));
        assert!(ctx.compatible(ctx.bool_(), ctx.error()));
    }

    #[test]
    fn formal_count_matches_type_list_length() {
        let mut ctx = TypeCtx::new();
        let list = ctx.type_list(vec![ctx.int(), ctx.bool_(), ctx.string()]);
        assert_eq!(ctx.formal_count(list), 3);
    }

    // Flyweight property (spec invariant: two type nodes denoting the same
    // structural type resolve to the same handle) checked over arbitrarily
    // nested `immutable` wrappers rather than just the one-level case above.
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    #[derive(Clone, Debug)]
    enum Shape {
        Int,
        Bool,
        Void,
        String,
        Immutable(Box<Shape>),
    }

    impl Shape {
        fn build(&self, ctx: &mut TypeCtx) -> Type {
            match self {
                Shape::Int => ctx.int(),
                Shape::Bool => ctx.bool_(),
                Shape::Void => ctx.void(),
                Shape::String => ctx.string(),
                Shape::Immutable(inner) => {
                    let t = inner.build(ctx);
                    ctx.immutable(t)
                }
            }
        }

        fn arbitrary_depth(g: &mut Gen, depth: u32) -> Shape {
            let leaf = depth == 0 || bool::arbitrary(g);
            if leaf {
                match u32::arbitrary(g) % 4 {
                    0 => Shape::Int,
                    1 => Shape::Bool,
                    2 => Shape::Void,
                    _ => Shape::String,
                }
            } else {
                Shape::Immutable(Box::new(Shape::arbitrary_depth(g, depth - 1)))
            }
        }
    }

    impl Arbitrary for Shape {
        fn arbitrary(g: &mut Gen) -> Self {
            Shape::arbitrary_depth(g, 4)
        }
    }

    #[quickcheck]
    fn structurally_equal_shapes_intern_to_the_same_handle(shape: Shape) -> bool {
        let mut ctx = TypeCtx::new();
        let a = shape.build(&mut ctx);
        let b = shape.build(&mut ctx);
        a == b
    }
}
