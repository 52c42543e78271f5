use super::revision::Revision;
use super::value::Value;
use super::CpuProfileNode;

/// Name of the indexed navigation method.
pub const GET_CHILD: &str = "getChild";

/// A named field and the function reading it from a node record.
pub struct FieldAccessor<R: Revision> {
    pub name: &'static str,
    read: for<'n> fn(&'n R::Node) -> Value<'n>,
}

impl<R: Revision> FieldAccessor<R> {
    pub fn read<'n>(&self, node: &'n R::Node) -> Value<'n> {
        (self.read)(node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub arity: usize,
}

/// Field and method table shared by every view of one revision.
///
/// Built once per process by [`Revision::shape`] and never mutated after.
pub struct Shape<R: Revision> {
    fields: Vec<FieldAccessor<R>>,
    methods: Vec<MethodDescriptor>,
}

impl<R: Revision> Shape<R> {
    pub(crate) fn build() -> Self {
        log::debug!("Initializing {} profile node shape", R::NAME);

        let fields = vec![
            FieldAccessor {
                name: "functionName",
                read: function_name::<R>,
            },
            FieldAccessor {
                name: "scriptName",
                read: script_name::<R>,
            },
            FieldAccessor {
                name: "lineNumber",
                read: line_number::<R>,
            },
            FieldAccessor {
                name: "totalTime",
                read: total_time::<R>,
            },
            FieldAccessor {
                name: "selfTime",
                read: self_time::<R>,
            },
            FieldAccessor {
                name: "totalSamplesCount",
                read: total_samples_count::<R>,
            },
            FieldAccessor {
                name: "selfSamplesCount",
                read: self_samples_count::<R>,
            },
            FieldAccessor {
                name: "callUid",
                read: call_uid::<R>,
            },
            FieldAccessor {
                name: "childrenCount",
                read: children_count::<R>,
            },
        ];

        let methods = vec![MethodDescriptor {
            name: GET_CHILD,
            arity: 1,
        }];

        Shape { fields, methods }
    }

    pub fn fields(&self) -> &[FieldAccessor<R>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldAccessor<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

fn function_name<R: Revision>(node: &R::Node) -> Value<'_> {
    Value::Str(node.function_name())
}

fn script_name<R: Revision>(node: &R::Node) -> Value<'_> {
    Value::Str(node.script_resource_name())
}

fn line_number<R: Revision>(node: &R::Node) -> Value<'_> {
    Value::Int(i64::from(node.line_number()))
}

fn total_time<R: Revision>(node: &R::Node) -> Value<'_> {
    R::total_time(node).into()
}

fn self_time<R: Revision>(node: &R::Node) -> Value<'_> {
    R::self_time(node).into()
}

fn total_samples_count<R: Revision>(node: &R::Node) -> Value<'_> {
    R::total_samples_count(node).into()
}

fn self_samples_count<R: Revision>(node: &R::Node) -> Value<'_> {
    Value::Number(R::self_samples_count(node))
}

fn call_uid<R: Revision>(node: &R::Node) -> Value<'_> {
    Value::Int(i64::from(node.call_uid()))
}

fn children_count<R: Revision>(node: &R::Node) -> Value<'_> {
    Value::Int(i64::from(node.children_count()))
}
