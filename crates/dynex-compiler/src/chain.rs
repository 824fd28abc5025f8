//! Null-propagation chains.
//!
//! `?.` and `?[` open a chain that lasts for the rest of the postfix
//! sequence. Every link after the trigger is guarded: at runtime a null
//! receiver yields null instead of failing, and statically each link is
//! lifted to its nullable form.
//!
//! ```text
//! a?.b.c
//!  │  │ └─ guarded, lifted (explicit `.` does not cancel the chain)
//!  │  └─── guarded, lifted
//!  └────── receiver; must be a value, not a type name
//! ```

use dynex_core::{NameComparer, SemanticError, Span, Ty};

use crate::tree::{ExprKind, TypedExpr};

/// Members of `T?` itself, looked up on the nullable rather than on `T`.
const NULLABLE_MEMBERS: [&str; 3] = ["HasValue", "Value", "GetValueOrDefault"];

/// State of the chain in one postfix sequence.
#[derive(Debug, Default)]
pub struct NullChain {
    active: bool,
    /// Declared (unlifted) type of the last link.
    last_declared: Option<Ty>,
}

impl NullChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a conditional access has been seen in this sequence.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Open (or continue) the chain at a `?.` or `?[` token.
    ///
    /// `receiver_is_type` is set when the receiver is a type name used for
    /// static access.
    pub fn trigger(&mut self, receiver_is_type: bool, span: Span) -> Result<(), SemanticError> {
        if receiver_is_type {
            return Err(SemanticError::InvalidConditionalAccess {
                reason: "conditional access requires a value, not a type name".to_string(),
                span,
            });
        }
        if !self.active {
            tracing::trace!(%span, "null-propagation chain opened");
        }
        self.active = true;
        Ok(())
    }

    /// Type to look members up on for a receiver of type `ty`.
    ///
    /// Inside a chain this is the declared type of the previous link, so a
    /// lifted `int?` from `s?.Length` is accessed as `int`. At the trigger a
    /// `T?` receiver is accessed as `T`.
    pub fn member_receiver(&self, ty: &Ty) -> Ty {
        match (&self.last_declared, self.active) {
            (Some(declared), true) => declared.clone(),
            (None, true) => match ty {
                Ty::Nullable(inner) => (**inner).clone(),
                other => other.clone(),
            },
            _ => ty.clone(),
        }
    }

    /// Like [`member_receiver`](Self::member_receiver) for a named member.
    ///
    /// At the trigger, `HasValue`, `Value` and `GetValueOrDefault` stay on
    /// the `T?` receiver instead of targeting `T`.
    pub fn named_member_receiver(&self, ty: &Ty, member: &str, cmp: NameComparer) -> Ty {
        let at_trigger = self.active && self.last_declared.is_none();
        if at_trigger && ty.is_nullable() && NULLABLE_MEMBERS.iter().any(|m| cmp.matches(m, member)) {
            return ty.clone();
        }
        self.member_receiver(ty)
    }

    /// Turn a resolved access into a chain link.
    ///
    /// Outside a chain the node is returned as is. Inside, the access is
    /// marked guarded and its type lifted.
    pub fn link(&mut self, mut expr: TypedExpr) -> Result<TypedExpr, SemanticError> {
        if !self.active {
            return Ok(expr);
        }
        if expr.ty == Ty::Void {
            return Err(SemanticError::InvalidConditionalAccess {
                reason: "the member returns no value".to_string(),
                span: expr.span,
            });
        }
        if let ExprKind::Access { guarded, .. } = &mut expr.kind {
            *guarded = true;
        }
        self.last_declared = Some(expr.ty.clone());
        expr.ty = Ty::nullable(expr.ty);
        Ok(expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Member;

    fn access(ty: Ty) -> TypedExpr {
        TypedExpr::new(
            ExprKind::Access {
                receiver: Box::new(TypedExpr::new(
                    ExprKind::Parameter { index: 0, depth: 0 },
                    Ty::String,
                    Span::default(),
                )),
                member: Member::StringIndex,
                args: Vec::new(),
                guarded: false,
            },
            ty,
            Span::default(),
        )
    }

    #[test]
    fn inactive_chain_is_transparent() {
        let mut chain = NullChain::new();
        let expr = chain.link(access(Ty::Int)).unwrap();
        assert_eq!(expr.ty, Ty::Int);
        assert!(matches!(expr.kind, ExprKind::Access { guarded: false, .. }));
        assert_eq!(chain.member_receiver(&Ty::nullable(Ty::Int)), Ty::nullable(Ty::Int));
    }

    #[test]
    fn links_are_guarded_and_lifted() {
        let mut chain = NullChain::new();
        chain.trigger(false, Span::default()).unwrap();
        assert!(chain.is_active());
        let first = chain.link(access(Ty::Int)).unwrap();
        assert_eq!(first.ty, Ty::nullable(Ty::Int));
        assert!(matches!(first.kind, ExprKind::Access { guarded: true, .. }));
        assert_eq!(chain.member_receiver(&first.ty), Ty::Int);

        let second = chain.link(access(Ty::String)).unwrap();
        assert_eq!(second.ty, Ty::String);
    }

    #[test]
    fn nullable_members_keep_the_nullable_receiver() {
        let mut chain = NullChain::new();
        chain.trigger(false, Span::default()).unwrap();
        let receiver = Ty::nullable(Ty::Int);
        for member in ["HasValue", "Value", "GetValueOrDefault"] {
            assert_eq!(chain.named_member_receiver(&receiver, member, NameComparer::Ordinal), receiver);
        }
        assert_eq!(chain.named_member_receiver(&receiver, "hasvalue", NameComparer::IgnoreCase), receiver);
        assert_eq!(chain.named_member_receiver(&receiver, "CompareTo", NameComparer::Ordinal), Ty::Int);

        chain.link(access(Ty::Int)).unwrap();
        assert_eq!(chain.named_member_receiver(&Ty::nullable(Ty::Int), "HasValue", NameComparer::Ordinal), Ty::Int);
    }

    #[test]
    fn type_receivers_and_void_links_fail() {
        let mut chain = NullChain::new();
        assert!(matches!(
            chain.trigger(true, Span::default()),
            Err(SemanticError::InvalidConditionalAccess { .. })
        ));
        chain.trigger(false, Span::default()).unwrap();
        assert!(chain.link(access(Ty::Void)).is_err());
    }
}
