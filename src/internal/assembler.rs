use rustc_hash::FxHashMap;

use crate::Reader;

use super::{
    code::{Code, NameAllocator},
    VarID,
};

/// The signature of a function rendered by [`Assembler::compile_function`].
#[derive(Debug, Clone)]
pub(crate) struct Signature {
    /// The function name.
    pub(crate) name: &'static str,
    /// The generic parameter list including the angle brackets, or an empty string.
    pub(crate) generics: String,
    /// The parameters as pairs of name and type.
    pub(crate) params: Vec<(Code, String)>,
}

/// Collects variables and bound values while code is generated.
///
/// Readers that have no inline form are bound: the generated code refers to them through a
/// variable that is initialized from a runtime slice of values. Binding the same reader twice
/// yields the same variable.
#[derive(Debug)]
pub(crate) struct Assembler<C> {
    next_var: u32,
    bindings: Vec<(VarID, Reader<C>)>,
    bound: FxHashMap<usize, VarID>,
}

impl<C> Default for Assembler<C> {
    fn default() -> Self {
        Self {
            next_var: 0,
            bindings: Vec::new(),
            bound: FxHashMap::default(),
        }
    }
}

impl<C> Assembler<C> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh variable.
    pub(crate) fn var(&mut self) -> VarID {
        let var = VarID::new(self.next_var);
        self.next_var += 1;
        var
    }

    /// Returns the variable bound to the reader, binding it if necessary.
    pub(crate) fn bind(&mut self, reader: &Reader<C>) -> VarID {
        if let Some(var) = self.bound.get(&reader.identity()) {
            return *var;
        }
        let var = self.var();
        self.bound.insert(reader.identity(), var);
        self.bindings.push((var, reader.clone()));
        var
    }

    /// The bound readers in the order they were bound.
    pub(crate) fn bindings(&self) -> &[(VarID, Reader<C>)] {
        &self.bindings
    }

    /// The bound readers as the value slice the rendered wrapper expects.
    pub(crate) fn values(&self) -> Vec<Reader<C>> {
        self.bindings.iter().map(|(_, r)| r.clone()).collect()
    }

    /// A name allocator that has named the bound variables first, in binding order.
    pub(crate) fn name_allocator(&self) -> NameAllocator {
        let mut names = NameAllocator::new();
        for (var, _) in &self.bindings {
            names.name(*var);
        }
        names
    }

    /// Renders a function with the given signature and body.
    ///
    /// Without bindings this is a plain function. Otherwise the rendered function takes the bound
    /// values (see [`Assembler::values`]), declares one local per binding and returns a closure
    /// with the signature's parameters that captures them.
    pub(crate) fn compile_function(&self, signature: &Signature, body: &Code) -> String {
        let mut names = self.name_allocator();
        if self.bindings.is_empty() {
            return render_function(signature, body, &mut names);
        }
        let types = signature
            .params
            .iter()
            .map(|(_, ty)| ty.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut out = format!(
            "pub fn {}{}(values: &[Reader<C>]) -> impl Fn({}) + '_ {{\n",
            signature.name, signature.generics, types
        );
        for (slot, (var, _)) in self.bindings.iter().enumerate() {
            out.push_str(&format!("let {} = &values[{}];\n", names.name(*var), slot));
        }
        out.push_str("move |");
        render_params(signature, &mut names, &mut out);
        out.push_str("| {\n");
        body.render_to(&mut names, &mut out);
        out.push_str("}\n}\n");
        out
    }
}

/// Renders a plain function. Bound variables must already be named by `names`.
pub(crate) fn render_function(
    signature: &Signature,
    body: &Code,
    names: &mut NameAllocator,
) -> String {
    let mut out = format!("pub fn {}{}(", signature.name, signature.generics);
    render_params(signature, names, &mut out);
    out.push_str(") {\n");
    body.render_to(names, &mut out);
    out.push_str("}\n");
    out
}

fn render_params(signature: &Signature, names: &mut NameAllocator, out: &mut String) {
    for (i, (param, ty)) in signature.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        param.render_to(names, out);
        out.push_str(": ");
        out.push_str(ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::code::code;

    fn signature(arg: VarID) -> Signature {
        Signature {
            name: "read",
            generics: String::new(),
            params: vec![
                (Code::Var(arg), "&[u8]".to_string()),
                (Code::from("ctx"), "&()".to_string()),
            ],
        }
    }

    #[test]
    fn test_bind_deduplicates() {
        let mut asm = Assembler::<()>::new();
        let custom = Reader::custom(|_, o, _| o as isize);
        let other = Reader::custom(|_, o, _| o as isize);
        let a = asm.bind(&custom);
        let b = asm.bind(&custom.clone());
        let c = asm.bind(&other);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(asm.bindings().len(), 2);
        assert!(asm.values()[0].ptr_eq(&custom));
    }

    #[test]
    fn test_plain_function() {
        let mut asm = Assembler::<()>::new();
        let k = asm.var();
        let r = asm.var();
        let body = Code::Block(vec![
            Code::Declare { var: r, init: None },
            Code::assign(r, code![k, ".len()"]),
            code!["let _ = ", r, ";\n"],
        ]);
        assert_eq!(
            asm.compile_function(&signature(k), &body),
            "pub fn read(a: &[u8], ctx: &()) {\nlet mut b;\nb = a.len();\nlet _ = b;\n}\n"
        );
    }

    #[test]
    fn test_wrapper_function() {
        let mut asm = Assembler::<()>::new();
        let k = asm.var();
        let custom = Reader::custom(|_, o, _| o as isize);
        let bound = asm.bind(&custom);
        asm.bind(&custom);
        let body = code![bound, ".read(", k, ", 0, ctx);\n"];
        let source = asm.compile_function(&signature(k), &body);
        assert_eq!(
            source,
            "pub fn read(values: &[Reader<C>]) -> impl Fn(&[u8], &()) + '_ {\n\
             let a = &values[0];\n\
             move |b: &[u8], ctx: &()| {\n\
             a.read(b, 0, ctx);\n\
             }\n\
             }\n"
        );
        // Deterministic rendering.
        assert_eq!(source, asm.compile_function(&signature(k), &body));
    }
}
