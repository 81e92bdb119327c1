use darling::{ast, FromDeriveInput, FromField};
use proc_macro2::TokenTree;
use quote::{format_ident, quote, ToTokens};
use syn::Meta;

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named), forward_attrs)]
struct ModelInputReceiver {
	ident: syn::Ident,

	generics: syn::Generics,

	data: ast::Data<(), ModelFieldReceiver>,

	attrs: Vec<syn::Attribute>,
}

#[derive(Debug, FromField)]
#[darling(forward_attrs)]
struct ModelFieldReceiver {
	ident: Option<syn::Ident>,

	ty: syn::Type,
	vis: syn::Visibility,

	attrs: Vec<syn::Attribute>,
}

/// Whether the field carries `#[serde(skip)]` or `#[serde(skip_deserializing)]`,
/// meaning clients never provide it.
fn is_server_only(attrs: &[syn::Attribute]) -> bool {
	attrs.iter().any(|attr| {
		let Meta::List(ref list) = attr.meta else {
			return false;
		};

		if !list.path.is_ident("serde") {
			return false;
		}

		list.tokens.to_token_stream().into_iter().any(|token| {
			matches!(token, TokenTree::Ident(ref ident) if ident == "skip_deserializing" || ident == "skip")
		})
	})
}

fn is_option(ty: &syn::Type) -> bool {
	let syn::Type::Path(ref path) = ty else {
		return false;
	};

	path.qself.is_none()
		&& path
			.path
			.segments
			.last()
			.is_some_and(|segment| segment.ident == "Option")
}

pub fn from_input(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
	let input = syn::parse_macro_input!(input as syn::DeriveInput);
	let receiver = match ModelInputReceiver::from_derive_input(&input) {
		Ok(x) => x,
		Err(e) => return e.write_errors().into(),
	};

	let ident = &receiver.ident;
	let vis = &input.vis;
	let generics = &receiver.generics;
	let create_ident = format_ident!("Create{}Input", ident);
	let update_ident = format_ident!("Update{}Input", ident);

	let attrs = &receiver.attrs;

	let Some(fields) = receiver.data.take_struct() else {
		return syn::Error::new_spanned(ident, "#[model] only supports structs with named fields")
			.into_compile_error()
			.into();
	};

	let fields = fields
		.iter()
		.filter(|field| !is_server_only(&field.attrs))
		.filter_map(|field| {
			let ident = field.ident.as_ref()?;

			Some((&field.attrs, ident, &field.ty, &field.vis))
		})
		.collect::<Vec<_>>();

	let create_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		quote! {
			#(#attrs)*
			#vis #ident: #ty,
		}
	});

	// An optional field can be cleared, so `null` becomes `Some(None)`
	// while a missing key stays `None`.
	let present_path = format!("{update_ident}::present");
	let has_optional = fields.iter().any(|(_, _, ty, _)| is_option(ty));

	let update_fields = fields.iter().map(|(attrs, ident, ty, vis)| {
		let present = is_option(ty).then(|| {
			quote! { #[serde(default, deserialize_with = #present_path)] }
		});

		quote! {
			#(#attrs)*
			#present
			#vis #ident: Option<#ty>,
		}
	});

	let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
	let present_impl = has_optional.then(|| {
		quote! {
			impl #impl_generics #update_ident #ty_generics #where_clause {
				fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
				where
					D: ::serde::Deserializer<'de>,
					T: ::serde::Deserialize<'de>,
				{
					<T as ::serde::Deserialize<'de>>::deserialize(deserializer).map(Some)
				}
			}
		}
	});

	quote! {
		#input

		#(#attrs)*
		#vis struct #create_ident #generics {
			#(
				#create_fields
			)*
		}

		#(#attrs)*
		#vis struct #update_ident #generics {
			#(
				#update_fields
			)*
		}

		#present_impl
	}
	.into()
}
