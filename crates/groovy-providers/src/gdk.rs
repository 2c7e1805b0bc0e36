//! GDK (Groovy Development Kit) method metadata.
//!
//! The runtime decorates standard library types with extra methods;
//! completion surfaces them on receivers of matching types. The provider is
//! injected so embedders can substitute a richer table (or one generated
//! from the actual runtime); [`DefaultGdkProvider`] carries the common
//! core.

/// One GDK-contributed method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdkMethod {
    pub name: &'static str,
    /// Rendered signature, shown as completion detail.
    pub signature: &'static str,
}

const fn m(name: &'static str, signature: &'static str) -> GdkMethod {
    GdkMethod { name, signature }
}

/// Methods every receiver gets.
const OBJECT_METHODS: &[GdkMethod] = &[
    m("toString", "String toString()"),
    m("equals", "boolean equals(Object other)"),
    m("hashCode", "int hashCode()"),
    m("getClass", "Class getClass()"),
    m("with", "Object with(Closure closure)"),
    m("inspect", "String inspect()"),
    m("dump", "String dump()"),
];

const LIST_METHODS: &[GdkMethod] = &[
    m("each", "List each(Closure closure)"),
    m("eachWithIndex", "List eachWithIndex(Closure closure)"),
    m("collect", "List collect(Closure transform)"),
    m("find", "Object find(Closure predicate)"),
    m("findAll", "List findAll(Closure predicate)"),
    m("findIndexOf", "int findIndexOf(Closure predicate)"),
    m("any", "boolean any(Closure predicate)"),
    m("every", "boolean every(Closure predicate)"),
    m("inject", "Object inject(Object initial, Closure accumulator)"),
    m("sum", "Object sum()"),
    m("min", "Object min()"),
    m("max", "Object max()"),
    m("count", "int count(Closure predicate)"),
    m("sort", "List sort()"),
    m("reverse", "List reverse()"),
    m("flatten", "List flatten()"),
    m("unique", "List unique()"),
    m("join", "String join(String separator)"),
    m("first", "Object first()"),
    m("last", "Object last()"),
    m("take", "List take(int n)"),
    m("drop", "List drop(int n)"),
    m("groupBy", "Map groupBy(Closure classifier)"),
    m("size", "int size()"),
    m("isEmpty", "boolean isEmpty()"),
    m("contains", "boolean contains(Object element)"),
    m("indexOf", "int indexOf(Object element)"),
    m("add", "boolean add(Object element)"),
    m("remove", "Object remove(int index)"),
    m("get", "Object get(int index)"),
];

const MAP_METHODS: &[GdkMethod] = &[
    m("each", "Map each(Closure closure)"),
    m("collect", "List collect(Closure transform)"),
    m("collectEntries", "Map collectEntries(Closure transform)"),
    m("find", "Map.Entry find(Closure predicate)"),
    m("findAll", "Map findAll(Closure predicate)"),
    m("any", "boolean any(Closure predicate)"),
    m("every", "boolean every(Closure predicate)"),
    m("groupBy", "Map groupBy(Closure classifier)"),
    m("keySet", "Set keySet()"),
    m("values", "Collection values()"),
    m("entrySet", "Set entrySet()"),
    m("get", "Object get(Object key)"),
    m("put", "Object put(Object key, Object value)"),
    m("containsKey", "boolean containsKey(Object key)"),
    m("containsValue", "boolean containsValue(Object value)"),
    m("subMap", "Map subMap(Collection keys)"),
    m("size", "int size()"),
    m("isEmpty", "boolean isEmpty()"),
    m("remove", "Object remove(Object key)"),
];

const STRING_METHODS: &[GdkMethod] = &[
    m("size", "int size()"),
    m("length", "int length()"),
    m("toUpperCase", "String toUpperCase()"),
    m("toLowerCase", "String toLowerCase()"),
    m("capitalize", "String capitalize()"),
    m("trim", "String trim()"),
    m("split", "String[] split(String regex)"),
    m("tokenize", "List tokenize(String delimiters)"),
    m("replace", "String replace(CharSequence target, CharSequence replacement)"),
    m("replaceAll", "String replaceAll(String regex, String replacement)"),
    m("contains", "boolean contains(CharSequence s)"),
    m("startsWith", "boolean startsWith(String prefix)"),
    m("endsWith", "boolean endsWith(String suffix)"),
    m("substring", "String substring(int begin)"),
    m("matches", "boolean matches(String regex)"),
    m("toInteger", "Integer toInteger()"),
    m("toLong", "Long toLong()"),
    m("toBigDecimal", "BigDecimal toBigDecimal()"),
    m("reverse", "String reverse()"),
    m("center", "String center(Number width)"),
    m("padLeft", "String padLeft(Number width)"),
    m("padRight", "String padRight(Number width)"),
    m("eachLine", "Object eachLine(Closure closure)"),
    m("readLines", "List readLines()"),
];

const NUMBER_METHODS: &[GdkMethod] = &[
    m("times", "void times(Closure closure)"),
    m("upto", "void upto(Number to, Closure closure)"),
    m("downto", "void downto(Number to, Closure closure)"),
    m("step", "void step(Number to, Number by, Closure closure)"),
    m("abs", "Number abs()"),
];

const RANGE_METHODS: &[GdkMethod] = &[
    m("each", "Range each(Closure closure)"),
    m("collect", "List collect(Closure transform)"),
    m("contains", "boolean contains(Object element)"),
    m("step", "List step(int step)"),
    m("size", "int size()"),
];

/// Source of GDK methods for a receiver type, injected into completion.
pub trait GdkProvider: Send + Sync {
    /// Methods for the raw (generics-stripped) receiver class name. The
    /// universal `Object` decorations are appended by the caller.
    fn methods_for(&self, class_name: &str) -> Vec<GdkMethod>;

    fn object_methods(&self) -> Vec<GdkMethod> {
        OBJECT_METHODS.to_vec()
    }
}

/// The built-in table keyed by common JDK/GDK receiver types.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGdkProvider;

impl GdkProvider for DefaultGdkProvider {
    fn methods_for(&self, class_name: &str) -> Vec<GdkMethod> {
        match class_name {
            "List" | "ArrayList" | "LinkedList" | "Collection" | "Set" | "HashSet" => {
                LIST_METHODS.to_vec()
            }
            "Map" | "LinkedHashMap" | "HashMap" => MAP_METHODS.to_vec(),
            "String" | "GString" | "CharSequence" => STRING_METHODS.to_vec(),
            "Integer" | "Long" | "Short" | "Byte" | "Double" | "Float" | "Number"
            | "BigDecimal" | "BigInteger" => NUMBER_METHODS.to_vec(),
            "Range" | "IntRange" => RANGE_METHODS.to_vec(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_receivers_get_iteration_methods() {
        let gdk = DefaultGdkProvider;
        let methods = gdk.methods_for("ArrayList");
        for expected in ["each", "collect", "find", "size"] {
            assert!(methods.iter().any(|m| m.name == expected), "missing {expected}");
        }
    }

    #[test]
    fn unknown_receiver_gets_only_object_methods() {
        let gdk = DefaultGdkProvider;
        assert!(gdk.methods_for("Widget").is_empty());
        assert!(gdk.object_methods().iter().any(|m| m.name == "toString"));
    }
}
