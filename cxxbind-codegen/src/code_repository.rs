//! Support headers emitted next to the generated module.

/// A C++ header the generated code may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportHeader {
    pub file_name: &'static str,
    pub namespace: &'static str,
    pub code: &'static str,
}

/// Sequence helpers used by the array transformers.
pub const CONVENIENCE: SupportHeader = SupportHeader {
    file_name: "__convenience.pypp.hpp",
    namespace: "pyplusplus::convenience",
    code: CONVENIENCE_CODE,
};

/// Every support header, looked up by file name when writing output.
pub const ALL: &[SupportHeader] = &[CONVENIENCE];

/// Find the support header registered under `file_name`.
pub fn find(file_name: &str) -> Option<&'static SupportHeader> {
    ALL.iter().find(|h| h.file_name == file_name)
}

const CONVENIENCE_CODE: &str = r#"#ifndef __convenience_pyplusplus_hpp__
#define __convenience_pyplusplus_hpp__

#include "boost/python.hpp"
#include <sstream>

namespace pyplusplus{ namespace convenience{

inline void raise_error( PyObject *exception, const char *message ){
    PyErr_SetString( exception, message );
    boost::python::throw_error_already_set();
}

inline void ensure_sequence( boost::python::object seq, Py_ssize_t expected_length=-1 ){
    PyObject* seq_impl = seq.ptr();
    if( !PySequence_Check( seq_impl ) ){
        raise_error( PyExc_TypeError, "Sequence expected" );
    }
    Py_ssize_t length = PySequence_Length( seq_impl );
    if( expected_length != -1 && length != expected_length ){
        std::stringstream err;
        err << "Expected sequence length is " << expected_length << ". "
            << "Actual sequence length is " << length << ".";
        raise_error( PyExc_ValueError, err.str().c_str() );
    }
}

template< class ExpectedType >
void ensure_uniform_sequence( boost::python::object seq, Py_ssize_t expected_length=-1 ){
    ensure_sequence( seq, expected_length );
    Py_ssize_t length = boost::python::len( seq );
    for( Py_ssize_t index = 0; index < length; ++index ){
        boost::python::object item = seq[index];
        boost::python::extract<ExpectedType> type_checker( item );
        if( !type_checker.check() ){
            std::stringstream err;
            err << "Sequence should contain only items with type \""
                << boost::python::type_id<ExpectedType>().name() << "\". "
                << "Item at position " << index << " has different type.";
            raise_error( PyExc_ValueError, err.str().c_str() );
        }
    }
}

template< class Type >
struct array_inserter_t{
    typedef Type value_type;

    array_inserter_t( Type* array, Py_ssize_t size )
    : m_array( array ), m_curr_pos( 0 ), m_size( size )
    {}

    void insert( const Type& item ){
        if( m_size <= m_curr_pos ){
            raise_error( PyExc_IndexError, "Index out of range" );
        }
        m_array[ m_curr_pos ] = item;
        ++m_curr_pos;
    }

private:
    Type* m_array;
    Py_ssize_t m_curr_pos;
    const Py_ssize_t m_size;
};

template< class Type >
array_inserter_t<Type> array_inserter( Type* array, Py_ssize_t size ){
    return array_inserter_t<Type>( array, size );
}

struct list_inserter{
    explicit list_inserter( boost::python::list& py_list )
    : m_py_list( py_list )
    {}

    template< class Type >
    void insert( const Type& item ){
        m_py_list.append( item );
    }

private:
    boost::python::list& m_py_list;
};

template< class Inserter >
void copy_sequence( boost::python::object seq, Inserter inserter ){
    Py_ssize_t length = boost::python::len( seq );
    for( Py_ssize_t index = 0; index < length; ++index ){
        boost::python::object item = seq[index];
        inserter.insert( boost::python::extract< typename Inserter::value_type >( item ) );
    }
}

template< class Iterator, class Inserter >
void copy_container( Iterator begin, Iterator end, Inserter inserter ){
    for( Iterator index = begin; index != end; ++index ){
        inserter.insert( *index );
    }
}

} /*convenience*/ } /*pyplusplus*/

#endif//__convenience_pyplusplus_hpp__
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_convenience() {
        let header = find("__convenience.pypp.hpp").expect("registered");
        assert_eq!(header.namespace, "pyplusplus::convenience");
        assert!(header.code.contains("ensure_uniform_sequence"));
        assert!(find("missing.hpp").is_none());
    }
}
